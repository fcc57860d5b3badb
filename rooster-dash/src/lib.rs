//! rooster-dash library interface
//!
//! Exposes the dashboard state, router and logic modules for the binary and
//! for integration testing.

pub mod api;
pub mod draft;
pub mod error;
pub mod filter;
pub mod matching;
pub mod notify;
pub mod review;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use rooster_common::events::EventBus;
use rooster_common::store::{ApprovedLog, JsonStore};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::draft::DraftSession;
use crate::notify::Notifier;
use crate::services::{SlackClient, TextCombiner};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Article, tag, subscription and review store
    pub store: Arc<JsonStore>,
    /// Approved texts
    pub approved: Arc<ApprovedLog>,
    /// The curator's current draft
    pub draft: Arc<RwLock<DraftSession>>,
    pub combiner: Arc<dyn TextCombiner>,
    pub notifier: Arc<dyn Notifier>,
    pub slack: Arc<SlackClient>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        root_folder: &Path,
        combiner: Arc<dyn TextCombiner>,
        notifier: Arc<dyn Notifier>,
        slack: Arc<SlackClient>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store: Arc::new(JsonStore::in_root(root_folder)),
            approved: Arc::new(ApprovedLog::in_root(root_folder)),
            draft: Arc::new(RwLock::new(DraftSession::default())),
            combiner,
            notifier,
            slack,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::sse_routes())
        .merge(api::article_routes())
        .merge(api::tag_routes())
        .merge(api::subscription_routes())
        .merge(api::draft_routes())
        .merge(api::review_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
