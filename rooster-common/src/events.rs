//! Event types for the Rooster event system
//!
//! Provides the shared event definitions and the EventBus used by every
//! service to push changes to connected dashboards over SSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Rooster event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DashboardEvent {
    /// A tag was processed and articles were retagged
    TagProcessed {
        tag: String,
        matched_article_ids: Vec<u64>,
        notifications_sent: usize,
        timestamp: DateTime<Utc>,
    },

    /// An alert email was delivered to a subscriber
    NotificationSent {
        subscription_id: u64,
        article_id: u64,
        timestamp: DateTime<Utc>,
    },

    /// A new alert subscription was stored
    SubscriptionCreated {
        subscription_id: u64,
        timestamp: DateTime<Utc>,
    },

    /// The curator's draft selection changed
    DraftChanged {
        article_ids: Vec<u64>,
        timestamp: DateTime<Utc>,
    },

    /// A draft entered the review queue
    ReviewSubmitted {
        review_id: u64,
        timestamp: DateTime<Utc>,
    },

    /// A review item was approved and appended to the approved log
    ReviewApproved {
        review_id: u64,
        approved_id: u64,
        timestamp: DateTime<Utc>,
    },

    /// A review item was rejected
    ReviewRejected {
        review_id: u64,
        timestamp: DateTime<Utc>,
    },

    /// The ingestion service finished a run
    IngestCompleted {
        total_deduped: usize,
        relevant: usize,
        published: usize,
        timestamp: DateTime<Utc>,
    },
}

impl DashboardEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            DashboardEvent::TagProcessed { .. } => "TagProcessed",
            DashboardEvent::NotificationSent { .. } => "NotificationSent",
            DashboardEvent::SubscriptionCreated { .. } => "SubscriptionCreated",
            DashboardEvent::DraftChanged { .. } => "DraftChanged",
            DashboardEvent::ReviewSubmitted { .. } => "ReviewSubmitted",
            DashboardEvent::ReviewApproved { .. } => "ReviewApproved",
            DashboardEvent::ReviewRejected { .. } => "ReviewRejected",
            DashboardEvent::IngestCompleted { .. } => "IngestCompleted",
        }
    }
}

/// Broadcast channel for DashboardEvents
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashboardEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DashboardEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
