//! Draft assembly endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rooster_common::events::DashboardEvent;
use rooster_common::{ReviewItem, SourceRef};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::draft::{compile, CompiledDraft, DraftSession};
use crate::error::{ApiError, ApiResult};
use crate::review;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineRequest {
    #[serde(default)]
    pub existing_text: String,
    #[serde(default)]
    pub new_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineResponse {
    pub combined_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    #[serde(default)]
    pub article_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub article_id: u64,
}

/// Current draft with its attributions
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub article_ids: Vec<u64>,
    pub text: String,
    pub sources: Vec<SourceRef>,
}

impl DraftView {
    fn new(session: &DraftSession, sources: Vec<SourceRef>) -> Self {
        Self {
            article_ids: session.article_ids.clone(),
            text: session.text.clone(),
            sources,
        }
    }
}

fn emit_draft_changed(state: &AppState, session: &DraftSession) {
    state.event_bus.emit_lossy(DashboardEvent::DraftChanged {
        article_ids: session.article_ids.clone(),
        timestamp: Utc::now(),
    });
}

/// POST /api/draft/combine
pub async fn combine_texts(
    State(state): State<AppState>,
    Json(request): Json<CombineRequest>,
) -> ApiResult<Json<CombineResponse>> {
    if request.new_text.trim().is_empty() {
        return Err(ApiError::BadRequest("newText is required".to_string()));
    }

    let combined_text = state
        .combiner
        .combine(&request.existing_text, &request.new_text)
        .await
        .map_err(|e| ApiError::BadGateway(format!("Text combination failed: {}", e)))?;

    Ok(Json(CombineResponse { combined_text }))
}

/// POST /api/draft/compile
pub async fn compile_draft(
    State(state): State<AppState>,
    Json(request): Json<CompileRequest>,
) -> ApiResult<Json<CompiledDraft>> {
    let data = state.store.load().await?;
    Ok(Json(compile(&data.articles, &request.article_ids)))
}

/// GET /api/draft
pub async fn get_draft(State(state): State<AppState>) -> ApiResult<Json<DraftView>> {
    let data = state.store.load().await?;
    let session = state.draft.read().await;
    Ok(Json(DraftView::new(&session, session.sources(&data.articles))))
}

/// POST /api/draft/toggle
pub async fn toggle_article(
    State(state): State<AppState>,
    Json(request): Json<ToggleRequest>,
) -> ApiResult<Json<DraftView>> {
    let data = state.store.load().await?;
    let mut session = state.draft.write().await;

    let added = session
        .toggle(request.article_id, &data.articles, state.combiner.as_ref())
        .await?;

    info!(
        article_id = request.article_id,
        added,
        selected = session.article_ids.len(),
        "Draft selection changed"
    );
    emit_draft_changed(&state, &session);

    Ok(Json(DraftView::new(&session, session.sources(&data.articles))))
}

/// DELETE /api/draft
pub async fn clear_draft(State(state): State<AppState>) -> StatusCode {
    let mut session = state.draft.write().await;
    session.clear();
    emit_draft_changed(&state, &session);
    StatusCode::NO_CONTENT
}

/// POST /api/draft/submit
///
/// Moves the current draft into the review queue and clears the session.
pub async fn submit_draft(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<ReviewItem>)> {
    let mut session = state.draft.write().await;
    if session.is_empty() {
        return Err(ApiError::BadRequest("Draft is empty".to_string()));
    }

    let mut txn = state.store.begin().await?;
    let sources = session.sources(&txn.data.articles);
    let item = review::submit(&mut txn.data, &session.text, sources, Utc::now())?;
    txn.commit().await?;

    session.clear();
    info!(review_id = item.id, "Draft submitted for review");
    state.event_bus.emit_lossy(DashboardEvent::ReviewSubmitted {
        review_id: item.id,
        timestamp: Utc::now(),
    });
    emit_draft_changed(&state, &session);

    Ok((StatusCode::CREATED, Json(item)))
}

pub fn draft_routes() -> Router<AppState> {
    Router::new()
        .route("/api/draft", get(get_draft).delete(clear_draft))
        .route("/api/draft/combine", post(combine_texts))
        .route("/api/draft/compile", post(compile_draft))
        .route("/api/draft/toggle", post(toggle_article))
        .route("/api/draft/submit", post(submit_draft))
}
