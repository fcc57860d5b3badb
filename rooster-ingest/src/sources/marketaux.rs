//! MarketAux news API

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{get_text, NewsSource, SourceError, SourceKind};
use crate::models::NewsItem;
use crate::normalize::timestamp_or_now;

pub const MARKETAUX_URL: &str = "https://api.marketaux.com/v1/news/all";

/// Items older than this are not requested
const LOOKBACK_HOURS: i64 = 24;

#[derive(Debug, Default, Deserialize)]
struct MarketAuxResponse {
    #[serde(default)]
    data: Vec<MarketAuxArticle>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketAuxArticle {
    title: Option<String>,
    description: Option<String>,
    snippet: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    updated_at: Option<String>,
    #[serde(default)]
    symbols: Vec<String>,
    #[serde(default)]
    entities: Vec<Value>,
}

impl MarketAuxArticle {
    /// `symbols` when present, otherwise entity symbols (objects or bare strings)
    fn tickers(&self) -> Vec<String> {
        if !self.symbols.is_empty() {
            return self.symbols.clone();
        }
        self.entities
            .iter()
            .filter_map(|e| match e {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map.get("symbol").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Parse a `/v1/news/all` response body
pub fn parse_response(body: &str) -> Result<Vec<NewsItem>, SourceError> {
    let response: MarketAuxResponse =
        serde_json::from_str(body).map_err(|e| SourceError::ParseError(e.to_string()))?;

    Ok(response
        .data
        .iter()
        .map(|a| {
            let published = timestamp_or_now(non_empty(&a.published_at).or(non_empty(&a.updated_at)));
            let mut item = NewsItem::new(
                "marketaux",
                a.url.as_deref().unwrap_or_default(),
                non_empty(&a.title).unwrap_or("MarketAux"),
                non_empty(&a.description).or(non_empty(&a.snippet)).unwrap_or_default(),
                published,
            );
            item.tickers = a.tickers();
            item
        })
        .collect())
}

pub struct MarketAuxSource {
    http_client: reqwest::Client,
    api_token: Option<String>,
    query: String,
}

impl MarketAuxSource {
    pub fn new(http_client: reqwest::Client, api_token: Option<String>, query: String) -> Self {
        Self {
            http_client,
            api_token,
            query,
        }
    }
}

#[async_trait]
impl NewsSource for MarketAuxSource {
    fn kind(&self) -> SourceKind {
        SourceKind::MarketAux
    }

    async fn fetch(&self) -> Result<Vec<NewsItem>, SourceError> {
        let Some(token) = self.api_token.as_deref() else {
            debug!("MARKETAUX_API_TOKEN not set, skipping MarketAux");
            return Ok(Vec::new());
        };

        let published_after = (Utc::now() - Duration::hours(LOOKBACK_HOURS))
            .format("%Y-%m-%dT%H:%M")
            .to_string();

        let request = self.http_client.get(MARKETAUX_URL).query(&[
            ("api_token", token),
            ("language", "en"),
            ("filter_entities", "true"),
            ("published_after", published_after.as_str()),
            ("limit", "50"),
            ("search", self.query.as_str()),
        ]);

        let body = get_text(request, "marketaux").await?;
        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "meta": {"found": 2},
            "data": [
                {
                    "title": "Nvidia (NVDA) tops forecasts",
                    "description": "<p>Chipmaker beats estimates.</p>",
                    "snippet": "ignored",
                    "url": "https://example.com/nvda",
                    "published_at": "2024-05-01T12:00:00.000000Z",
                    "entities": [{"symbol": "NVDA", "name": "NVIDIA"}, "AMD", {"name": "no symbol"}]
                },
                {
                    "title": "",
                    "snippet": "Snippet only",
                    "url": "https://example.com/x",
                    "updated_at": "2024-05-01T08:30:00",
                    "symbols": ["AAPL"]
                }
            ]
        }"#;

        let items = parse_response(body).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].source, "marketaux");
        assert_eq!(items[0].headline, "Nvidia (NVDA) tops forecasts");
        assert_eq!(items[0].body_text, "Chipmaker beats estimates.");
        assert_eq!(items[0].tickers, vec!["NVDA", "AMD"]);
        assert_eq!(items[0].published_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");

        assert_eq!(items[1].headline, "MarketAux");
        assert_eq!(items[1].body_text, "Snippet only");
        assert_eq!(items[1].tickers, vec!["AAPL"]);
        assert_eq!(items[1].published_at.to_rfc3339(), "2024-05-01T08:30:00+00:00");
    }

    #[test]
    fn test_missing_data_is_empty() {
        assert!(parse_response("{}").unwrap().is_empty());
        assert!(parse_response("not json").is_err());
    }

    #[tokio::test]
    async fn test_without_token_returns_nothing() {
        let source = MarketAuxSource::new(reqwest::Client::new(), None, "markets".into());
        assert!(source.fetch().await.unwrap().is_empty());
    }
}
