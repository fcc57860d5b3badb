//! Subscription alert sweep
//!
//! After articles are retagged, every (article × subscription) pair is checked
//! and matching articles the subscriber has not seen yet are sent out. The
//! notified set on each subscription prevents duplicate sends across sweeps.

use async_trait::async_trait;
use chrono::Utc;
use rooster_common::events::{DashboardEvent, EventBus};
use rooster_common::{Article, DashboardData};
use thiserror::Error;
use tracing::{info, warn};

use crate::matching::pending_notifications;

/// Alert delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Email not configured")]
    NotConfigured,

    #[error("Invalid address {0}: {1}")]
    InvalidAddress(String, String),

    #[error("Message build failed: {0}")]
    Message(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Delivers a single article alert to one recipient
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, article: &Article) -> Result<(), NotifyError>;
}

/// Notifier used when no email credentials are configured
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, _recipient: &str, _article: &Article) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured)
    }
}

/// Outcome of one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub sent: usize,
    pub failed: usize,
}

/// An alert recorded as sent in the store before it goes out
#[derive(Debug, Clone)]
pub struct Delivery {
    pub subscription_id: u64,
    pub email: String,
    pub article: Article,
}

/// Mark every pending (subscription, article) pair as notified
///
/// Returns the alerts to send. Committing the marks before sending means a
/// lost commit can never cause a second email for the same pair.
pub fn reserve(data: &mut DashboardData) -> Vec<Delivery> {
    pending_notifications(&data.articles, &data.subscriptions)
        .into_iter()
        .map(|pending| {
            let article = data.articles[pending.article_index].clone();
            let subscription = &mut data.subscriptions[pending.subscription_index];
            subscription.notified_article_ids.push(article.id);
            Delivery {
                subscription_id: subscription.id,
                email: subscription.email.clone(),
                article,
            }
        })
        .collect()
}

/// Send reserved alerts one after another
///
/// Returns the report and the deliveries that failed.
pub async fn deliver(
    deliveries: Vec<Delivery>,
    notifier: &dyn Notifier,
    event_bus: &EventBus,
) -> (SweepReport, Vec<Delivery>) {
    let mut report = SweepReport::default();
    let mut failed = Vec::new();

    for delivery in deliveries {
        info!(
            subscription_id = delivery.subscription_id,
            article_id = delivery.article.id,
            "Sending alert for \"{}\" to {}",
            delivery.article.title,
            delivery.email
        );

        match notifier.notify(&delivery.email, &delivery.article).await {
            Ok(()) => {
                report.sent += 1;
                event_bus.emit_lossy(DashboardEvent::NotificationSent {
                    subscription_id: delivery.subscription_id,
                    article_id: delivery.article.id,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(
                    subscription_id = delivery.subscription_id,
                    article_id = delivery.article.id,
                    error = %e,
                    "Alert delivery failed"
                );
                report.failed += 1;
                failed.push(delivery);
            }
        }
    }

    (report, failed)
}

/// Undo the reservation of failed deliveries so the next sweep retries them
pub fn release(data: &mut DashboardData, failed: &[Delivery]) {
    for delivery in failed {
        if let Some(subscription) = data
            .subscriptions
            .iter_mut()
            .find(|s| s.id == delivery.subscription_id)
        {
            subscription
                .notified_article_ids
                .retain(|id| *id != delivery.article.id);
        }
    }
}

/// Send all pending alerts and keep only successful deliveries recorded
///
/// In-memory form of reserve, deliver, release. A failed send stays pending,
/// so the next sweep retries it.
pub async fn sweep(
    data: &mut DashboardData,
    notifier: &dyn Notifier,
    event_bus: &EventBus,
) -> SweepReport {
    let deliveries = reserve(data);
    let (report, failed) = deliver(deliveries, notifier, event_bus).await;
    release(data, &failed);
    report
}
