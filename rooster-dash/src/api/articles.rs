//! Article listing with tag, priority and age filters

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use rooster_common::config::split_list;
use rooster_common::{Article, Priority};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::filter::ArticleFilter;
use crate::AppState;

/// Query parameters for GET /api/articles
///
/// `tags` and `priorities` are comma-separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleQuery {
    pub tags: Option<String>,
    pub priorities: Option<String>,
    pub hours: Option<u32>,
}

impl ArticleQuery {
    pub fn to_filter(&self) -> ApiResult<ArticleFilter> {
        let tags = self.tags.as_deref().map(split_list).unwrap_or_default();
        let priorities = self
            .priorities
            .as_deref()
            .map(split_list)
            .unwrap_or_default()
            .iter()
            .map(|p| {
                Priority::parse(p)
                    .ok_or_else(|| ApiError::BadRequest(format!("Unknown priority: {}", p)))
            })
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(ArticleFilter::new(tags, priorities, self.hours))
    }
}

/// GET /api/articles
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticleQuery>,
) -> ApiResult<Json<Vec<Article>>> {
    let filter = query.to_filter()?;
    let data = state.store.load().await?;
    let articles = filter.apply(&data.articles, Utc::now());

    tracing::debug!(count = articles.len(), hours = ?filter.hours, "Listing articles");
    Ok(Json(articles))
}

pub fn article_routes() -> Router<AppState> {
    Router::new().route("/api/articles", get(list_articles))
}
