//! rooster-ingest library interface
//!
//! News sources, the normalize/classify/score pipeline and publishing into
//! the shared article store.

pub mod api;
pub mod classify;
pub mod dedupe;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod publish;
pub mod score;
pub mod settings;
pub mod sources;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use rooster_common::events::EventBus;
use rooster_common::store::JsonStore;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::settings::IngestSettings;
use crate::sources::NewsSource;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared article store (published items land here)
    pub store: Arc<JsonStore>,
    pub sources: Arc<Vec<Box<dyn NewsSource>>>,
    pub settings: Arc<IngestSettings>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        root_folder: &Path,
        sources: Vec<Box<dyn NewsSource>>,
        settings: IngestSettings,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store: Arc::new(JsonStore::in_root(root_folder)),
            sources: Arc::new(sources),
            settings: Arc::new(settings),
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
        .merge(api::ingest_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
