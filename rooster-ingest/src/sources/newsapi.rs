//! NewsAPI `everything` endpoint

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{get_text, NewsSource, SourceError, SourceKind};
use crate::models::NewsItem;
use crate::normalize::timestamp_or_now;

pub const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";

#[derive(Debug, Default, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    #[serde(default)]
    source: Option<NewsApiSourceRef>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NewsApiSourceRef {
    name: Option<String>,
}

/// Parse an `everything` response body
///
/// The body text is the description followed by the content.
pub fn parse_response(body: &str) -> Result<Vec<NewsItem>, SourceError> {
    let response: NewsApiResponse =
        serde_json::from_str(body).map_err(|e| SourceError::ParseError(e.to_string()))?;

    Ok(response
        .articles
        .iter()
        .map(|a| {
            let source = a
                .source
                .as_ref()
                .and_then(|s| s.name.as_deref())
                .filter(|s| !s.trim().is_empty())
                .unwrap_or("newsapi");
            let title = a.title.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or("NewsAPI");
            let body = format!(
                "{}\n\n{}",
                a.description.as_deref().unwrap_or_default(),
                a.content.as_deref().unwrap_or_default()
            );

            NewsItem::new(
                source,
                a.url.as_deref().unwrap_or_default(),
                title,
                body.trim(),
                timestamp_or_now(a.published_at.as_deref()),
            )
        })
        .collect())
}

pub struct NewsApiSource {
    http_client: reqwest::Client,
    api_key: Option<String>,
    query: String,
    domains: Option<String>,
}

impl NewsApiSource {
    pub fn new(
        http_client: reqwest::Client,
        api_key: Option<String>,
        query: String,
        domains: Option<String>,
    ) -> Self {
        Self {
            http_client,
            api_key,
            query,
            domains,
        }
    }
}

#[async_trait]
impl NewsSource for NewsApiSource {
    fn kind(&self) -> SourceKind {
        SourceKind::NewsApi
    }

    async fn fetch(&self) -> Result<Vec<NewsItem>, SourceError> {
        let Some(key) = self.api_key.as_deref() else {
            debug!("NEWSAPI_API_KEY not set, skipping NewsAPI");
            return Ok(Vec::new());
        };

        let mut params = vec![
            ("q", self.query.as_str()),
            ("language", "en"),
            ("pageSize", "50"),
            ("sortBy", "publishedAt"),
            ("apiKey", key),
        ];
        if let Some(domains) = self.domains.as_deref().filter(|d| !d.trim().is_empty()) {
            params.push(("domains", domains));
        }

        let body = get_text(self.http_client.get(NEWSAPI_URL).query(&params), "newsapi").await?;
        parse_response(&body)
    }
}
