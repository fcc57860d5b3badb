//! Ingestion trigger endpoint

use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use rooster_common::events::DashboardEvent;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::NewsItem;
use crate::pipeline::{self, IngestCounts, DEFAULT_MIN_SCORE};
use crate::publish::publish;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IngestQuery {
    pub min_score: Option<f64>,
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub counts: IngestCounts,
    pub items: Vec<NewsItem>,
    /// Articles added to the store, 0 unless `publish=true`
    pub published: usize,
}

/// POST /ingest?min_score=&publish=
pub async fn run_ingest(
    State(state): State<AppState>,
    Query(query): Query<IngestQuery>,
) -> ApiResult<Json<IngestResponse>> {
    let min_score = query.min_score.unwrap_or(DEFAULT_MIN_SCORE);
    if !(0.0..=1.0).contains(&min_score) {
        return Err(ApiError::BadRequest(format!(
            "min_score must be between 0 and 1, got {}",
            min_score
        )));
    }

    info!(min_score, publish = query.publish, "Ingestion requested");
    let report = pipeline::run(&state.sources, &state.settings.watchlist, min_score).await;

    let published = if query.publish {
        publish(&state.store, &report.items).await?
    } else {
        0
    };

    state.event_bus.emit_lossy(DashboardEvent::IngestCompleted {
        total_deduped: report.counts.total_deduped,
        relevant: report.counts.relevant,
        published,
        timestamp: Utc::now(),
    });

    Ok(Json(IngestResponse {
        counts: report.counts,
        items: report.items,
        published,
    }))
}

pub fn ingest_routes() -> Router<AppState> {
    Router::new().route("/ingest", post(run_ingest))
}
