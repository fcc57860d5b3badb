//! News sources
//!
//! Each source fetches and normalizes its own items. A failing source never
//! aborts an ingestion run; the pipeline logs the error and counts it as
//! empty.

pub mod edgar;
pub mod marketaux;
pub mod newsapi;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::models::NewsItem;
use crate::settings::{IngestSettings, USER_AGENT};

pub use edgar::EdgarSource;
pub use marketaux::MarketAuxSource;
pub use newsapi::NewsApiSource;

/// Source fetch errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP {0} from {1}")]
    HttpStatus(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Which upstream an item batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    SecEdgar,
    MarketAux,
    NewsApi,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::SecEdgar => write!(f, "sec_edgar"),
            SourceKind::MarketAux => write!(f, "marketaux"),
            SourceKind::NewsApi => write!(f, "newsapi"),
        }
    }
}

/// A news upstream
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetch and normalize the latest items
    ///
    /// Unconfigured sources return an empty list.
    async fn fetch(&self) -> Result<Vec<NewsItem>, SourceError>;
}

/// HTTP client shared by the sources
pub fn build_http_client(settings: &IngestSettings) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SourceError::NetworkError(e.to_string()))
}

/// GET a URL and return the body of a successful response
pub(crate) async fn get_text(
    request: reqwest::RequestBuilder,
    label: &str,
) -> Result<String, SourceError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json, text/xml, application/xml")
        .send()
        .await
        .map_err(|e| SourceError::NetworkError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus(status.as_u16(), label.to_string()));
    }

    response
        .text()
        .await
        .map_err(|e| SourceError::NetworkError(e.to_string()))
}

/// The three production sources
pub fn default_sources(settings: &IngestSettings) -> Result<Vec<Box<dyn NewsSource>>, SourceError> {
    let http = build_http_client(settings)?;
    Ok(vec![
        Box::new(EdgarSource::new(http.clone(), settings.cik_tickers.clone())),
        Box::new(MarketAuxSource::new(
            http.clone(),
            settings.marketaux_api_token.clone(),
            settings.search_query(),
        )),
        Box::new(NewsApiSource::new(
            http,
            settings.newsapi_api_key.clone(),
            settings.search_query(),
            settings.newsapi_domains.clone(),
        )),
    ])
}
