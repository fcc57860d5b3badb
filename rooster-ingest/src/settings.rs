//! Resolved ingestion settings

use rooster_common::config::{resolve_setting, split_list, TomlConfig};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const USER_AGENT: &str = "MarketRooster-Ingestor/1.0 (contact: team@example.com)";

/// Credentials, query and scoring inputs for one service run
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub marketaux_api_token: Option<String>,
    pub newsapi_api_key: Option<String>,
    pub query_terms: Vec<String>,
    /// Comma-separated NewsAPI domain restriction
    pub newsapi_domains: Option<String>,
    pub watchlist: HashSet<String>,
    pub cik_tickers: HashMap<String, String>,
    pub request_timeout: Duration,
}

impl IngestSettings {
    /// Resolve from environment variables first, then the TOML config
    pub fn resolve(toml: &TomlConfig) -> Self {
        let ingest = &toml.ingest;

        let query_terms = resolve_setting("QUERY_TERMS", None)
            .map(|v| split_list(&v))
            .unwrap_or_else(|| ingest.query_terms.clone());
        let watchlist = resolve_setting("WATCHLIST", None)
            .map(|v| split_list(&v))
            .unwrap_or_else(|| ingest.watchlist.clone());

        Self {
            marketaux_api_token: resolve_setting(
                "MARKETAUX_API_TOKEN",
                ingest.marketaux_api_token.as_deref(),
            ),
            newsapi_api_key: resolve_setting("NEWSAPI_API_KEY", ingest.newsapi_api_key.as_deref()),
            query_terms,
            newsapi_domains: resolve_setting("NEWSAPI_DOMAINS", ingest.newsapi_domains.as_deref()),
            watchlist: watchlist.into_iter().map(|t| t.to_uppercase()).collect(),
            cik_tickers: ingest
                .cik_tickers
                .iter()
                .map(|(cik, ticker)| (cik.trim_start_matches('0').to_string(), ticker.clone()))
                .collect(),
            request_timeout: Duration::from_secs(ingest.request_timeout_secs),
        }
    }

    /// Search query: quoted terms joined with `OR`, or `markets` without terms
    pub fn search_query(&self) -> String {
        if self.query_terms.is_empty() {
            return "markets".to_string();
        }
        self.query_terms
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        let toml = TomlConfig::default();
        Self {
            marketaux_api_token: None,
            newsapi_api_key: None,
            query_terms: toml.ingest.query_terms,
            newsapi_domains: None,
            watchlist: toml.ingest.watchlist.into_iter().collect(),
            cik_tickers: HashMap::new(),
            request_timeout: Duration::from_secs(toml.ingest.request_timeout_secs),
        }
    }
}
