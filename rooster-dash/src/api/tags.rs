//! Tag management and the retag/alert sweep

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rooster_common::events::DashboardEvent;
use rooster_common::{Article, DashboardData, Tag};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::matching::apply_tag;
use crate::notify::{deliver, release, reserve, Delivery};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    #[serde(default)]
    pub name: Option<String>,
}

impl TagRequest {
    fn name(&self) -> ApiResult<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("Tag name is required".to_string()))
    }
}

/// Response of POST /api/tags/process
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTagResponse {
    pub updated_articles: Vec<Article>,
    pub all_tags: Vec<Tag>,
    pub matched_article_ids: Vec<u64>,
    pub notifications_sent: usize,
}

/// GET /api/tags
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    let data = state.store.load().await?;
    Ok(Json(data.tags))
}

/// POST /api/tags
///
/// Registers a tag without retagging articles.
pub async fn create_tag(
    State(state): State<AppState>,
    Json(request): Json<TagRequest>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    let name = request.name()?;
    let mut txn = state.store.begin().await?;

    if let Some(existing) = txn.data.find_tag(&name) {
        return Err(ApiError::Conflict(format!("Tag already exists: {}", existing.name)));
    }

    let tag = Tag {
        id: txn.data.next_tag_id(),
        name,
    };
    txn.data.tags.push(tag.clone());
    txn.commit().await?;

    info!(tag_id = tag.id, "Created tag \"{}\"", tag.name);
    Ok((StatusCode::CREATED, Json(tag)))
}

/// POST /api/tags/process
///
/// Adds the tag if absent, retags all articles and reserves pending alerts in
/// one store transaction, then sends them. Failed alerts are released again.
pub async fn process_tag(
    State(state): State<AppState>,
    Json(request): Json<TagRequest>,
) -> ApiResult<Json<ProcessTagResponse>> {
    let name = request.name()?;
    let mut txn = state.store.begin().await?;

    let name = match txn.data.find_tag(&name) {
        Some(existing) => existing.name.clone(),
        None => {
            let tag = Tag {
                id: txn.data.next_tag_id(),
                name: name.clone(),
            };
            info!(tag_id = tag.id, "Added tag \"{}\"", tag.name);
            txn.data.tags.push(tag);
            name
        }
    };

    let matched_article_ids = apply_tag(&mut txn.data.articles, &name)
        .map_err(|e| ApiError::BadRequest(format!("Unusable tag name: {}", e)))?;
    let deliveries = reserve(&mut txn.data);
    let mut data = txn.commit().await?;

    // Sends happen outside the store lock; failures are handed back afterwards
    let (report, failed) = deliver(deliveries, state.notifier.as_ref(), &state.event_bus).await;
    if !failed.is_empty() {
        match release_failed(&state, &failed).await {
            Ok(released) => data = released,
            Err(e) => error!(
                tag = %name,
                failed = failed.len(),
                error = %e,
                "Could not release failed alerts; they stay marked as sent"
            ),
        }
    }

    info!(
        tag = %name,
        matched = matched_article_ids.len(),
        sent = report.sent,
        failed = report.failed,
        "Tag processed"
    );
    state.event_bus.emit_lossy(DashboardEvent::TagProcessed {
        tag: name,
        matched_article_ids: matched_article_ids.clone(),
        notifications_sent: report.sent,
        timestamp: Utc::now(),
    });

    Ok(Json(ProcessTagResponse {
        updated_articles: data.articles,
        all_tags: data.tags,
        matched_article_ids,
        notifications_sent: report.sent,
    }))
}

async fn release_failed(state: &AppState, failed: &[Delivery]) -> ApiResult<DashboardData> {
    let mut txn = state.store.begin().await?;
    release(&mut txn.data, failed);
    Ok(txn.commit().await?)
}

pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tags", get(list_tags).post(create_tag))
        .route("/api/tags/process", post(process_tag))
}
