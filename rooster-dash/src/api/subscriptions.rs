//! Alert subscriptions

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use rooster_common::events::DashboardEvent;
use rooster_common::{Priority, Subscription};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priorities: Vec<Priority>,
}

/// POST /api/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let email = request
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("E-mail is required".to_string()))?
        .to_string();

    let mut txn = state.store.begin().await?;
    let subscription = Subscription {
        id: txn.data.next_subscription_id(),
        email,
        tags: request.tags,
        priorities: request.priorities,
        notified_article_ids: Vec::new(),
    };
    let subscription_id = subscription.id;
    txn.data.subscriptions.push(subscription);
    txn.commit().await?;

    tracing::info!(subscription_id, "Subscription saved");
    state.event_bus.emit_lossy(DashboardEvent::SubscriptionCreated {
        subscription_id,
        timestamp: Utc::now(),
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Subscription saved successfully." })),
    ))
}

pub fn subscription_routes() -> Router<AppState> {
    Router::new().route("/api/subscribe", post(subscribe))
}
