//! Review queue, approved log and Slack delivery

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rooster_common::events::DashboardEvent;
use rooster_common::models::ApprovedText;
use rooster_common::{ReviewItem, ReviewStatus, SourceRef};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::review;
use crate::services::ReviewMessage;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedTextRequest {
    #[serde(default)]
    pub approved_text: Option<String>,
}

/// GET /api/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> ApiResult<Json<Vec<ReviewItem>>> {
    let status = match query.status.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => Some(
            ReviewStatus::parse(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown review status: {}", s)))?,
        ),
        None => None,
    };

    let data = state.store.load().await?;
    let items = data
        .reviews
        .into_iter()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .collect();
    Ok(Json(items))
}

/// POST /api/reviews
pub async fn submit_review(
    State(state): State<AppState>,
    Json(request): Json<SubmitReviewRequest>,
) -> ApiResult<(StatusCode, Json<ReviewItem>)> {
    let mut txn = state.store.begin().await?;
    let item = review::submit(&mut txn.data, &request.text, request.sources, Utc::now())?;
    txn.commit().await?;

    info!(review_id = item.id, "Review item submitted");
    state.event_bus.emit_lossy(DashboardEvent::ReviewSubmitted {
        review_id: item.id,
        timestamp: Utc::now(),
    });
    Ok((StatusCode::CREATED, Json(item)))
}

impl ApproveRequest {
    /// An empty body approves the text as queued; anything else must be valid JSON
    fn from_body(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid approve body: {}", e)))
    }
}

/// POST /api/reviews/:id/approve
///
/// The decision is committed first, then the final text is appended to the
/// approved log. If the append fails the item is put back to pending.
pub async fn approve_review(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Bytes,
) -> ApiResult<Json<ReviewItem>> {
    let edited_text = ApproveRequest::from_body(&body)?.text;

    let mut txn = state.store.begin().await?;
    let snapshot = txn
        .data
        .reviews
        .iter()
        .find(|r| r.id == id)
        .cloned();
    let item = review::approve(&mut txn.data, id, edited_text, Utc::now())?;
    txn.commit().await?;

    let approved = match state.approved.append(&item.text).await {
        Ok(approved) => approved,
        Err(e) => {
            if let Some(snapshot) = snapshot {
                reopen(&state, snapshot).await;
            }
            return Err(e.into());
        }
    };

    info!(review_id = id, approved_id = approved.id, "Review item approved");
    state.event_bus.emit_lossy(DashboardEvent::ReviewApproved {
        review_id: id,
        approved_id: approved.id,
        timestamp: Utc::now(),
    });
    Ok(Json(item))
}

async fn reopen(state: &AppState, snapshot: ReviewItem) {
    let id = snapshot.id;
    let result = async {
        let mut txn = state.store.begin().await?;
        review::restore(&mut txn.data, snapshot)?;
        txn.commit().await?;
        Ok::<_, ApiError>(())
    }
    .await;

    match result {
        Ok(()) => warn!(review_id = id, "Approved log append failed; review item reopened"),
        Err(e) => error!(review_id = id, error = %e, "Could not reopen review item"),
    }
}

/// POST /api/reviews/:id/reject
pub async fn reject_review(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<ReviewItem>> {
    let mut txn = state.store.begin().await?;
    let item = review::reject(&mut txn.data, id, Utc::now())?;
    txn.commit().await?;

    info!(review_id = id, "Review item rejected");
    state.event_bus.emit_lossy(DashboardEvent::ReviewRejected {
        review_id: id,
        timestamp: Utc::now(),
    });
    Ok(Json(item))
}

/// POST /api/approved
pub async fn append_approved(
    State(state): State<AppState>,
    Json(request): Json<ApprovedTextRequest>,
) -> ApiResult<(StatusCode, Json<ApprovedText>)> {
    let text = request
        .approved_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("approvedText is required".to_string()))?;

    let entry = state.approved.append(&text).await?;
    info!(approved_id = entry.id, "Approved text stored");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/approved
pub async fn list_approved(State(state): State<AppState>) -> ApiResult<Json<Vec<ApprovedText>>> {
    Ok(Json(state.approved.list().await?))
}

fn require_text(message: &ReviewMessage) -> ApiResult<()> {
    if message.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is required".to_string()));
    }
    Ok(())
}

/// POST /api/reviews/send
pub async fn send_to_slack(
    State(state): State<AppState>,
    Json(message): Json<ReviewMessage>,
) -> ApiResult<Json<Value>> {
    require_text(&message)?;
    state.slack.send_webhook(&message).await?;
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/reviews/sendToMe
pub async fn send_to_me(
    State(state): State<AppState>,
    Json(message): Json<ReviewMessage>,
) -> ApiResult<Json<Value>> {
    require_text(&message)?;
    let channel = state.slack.send_dm(&message).await?;
    Ok(Json(json!({ "ok": true, "channel": channel })))
}

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reviews", get(list_reviews).post(submit_review))
        .route("/api/reviews/send", post(send_to_slack))
        .route("/api/reviews/sendToMe", post(send_to_me))
        .route("/api/reviews/:id/approve", post(approve_review))
        .route("/api/reviews/:id/reject", post(reject_review))
        .route("/api/approved", get(list_approved).post(append_approved))
}
