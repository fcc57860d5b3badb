//! SEC EDGAR "latest filings" Atom feeds

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{get_text, NewsSource, SourceError, SourceKind};
use crate::classify::classify_edgar;
use crate::models::{NewsItem, SEC_EDGAR};
use crate::normalize::{extract_cik, timestamp_or_now};

/// Latest 8-K, 10-Q and 10-K filings
pub const EDGAR_FEEDS: &[&str] = &[
    "https://www.sec.gov/cgi-bin/browse-edgar?action=getcurrent&CIK=&type=8-K&count=100&owner=exclude&output=atom",
    "https://www.sec.gov/cgi-bin/browse-edgar?action=getcurrent&CIK=&type=10-Q&count=100&owner=exclude&output=atom",
    "https://www.sec.gov/cgi-bin/browse-edgar?action=getcurrent&CIK=&type=10-K&count=100&owner=exclude&output=atom",
];

#[derive(Debug, Default, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: Option<AtomText>,
    #[serde(default)]
    link: Vec<AtomLink>,
    #[serde(default)]
    summary: Option<AtomText>,
    #[serde(default)]
    published: Option<AtomText>,
    #[serde(default)]
    updated: Option<AtomText>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: Option<String>,
}

fn text(value: &Option<AtomText>) -> Option<&str> {
    value.as_ref().map(|t| t.value.trim()).filter(|s| !s.is_empty())
}

/// Parse one Atom document into classified filing items
pub fn parse_feed(xml: &str, cik_tickers: &HashMap<String, String>) -> Result<Vec<NewsItem>, SourceError> {
    let feed: AtomFeed =
        quick_xml::de::from_str(xml).map_err(|e| SourceError::ParseError(e.to_string()))?;

    Ok(feed
        .entries
        .iter()
        .map(|entry| {
            let url = entry
                .link
                .iter()
                .find_map(|l| l.href.as_deref())
                .unwrap_or_default();
            let title = text(&entry.title).unwrap_or("SEC Filing");
            let summary = text(&entry.summary).unwrap_or_default();
            let published = timestamp_or_now(text(&entry.published).or(text(&entry.updated)));

            let mut item = NewsItem::new(SEC_EDGAR, url, title, summary, published);
            item.cik = extract_cik(url);
            classify_edgar(&mut item, summary, cik_tickers);
            item
        })
        .collect())
}

pub struct EdgarSource {
    http_client: reqwest::Client,
    cik_tickers: HashMap<String, String>,
    feeds: Vec<String>,
}

impl EdgarSource {
    pub fn new(http_client: reqwest::Client, cik_tickers: HashMap<String, String>) -> Self {
        Self {
            http_client,
            cik_tickers,
            feeds: EDGAR_FEEDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl NewsSource for EdgarSource {
    fn kind(&self) -> SourceKind {
        SourceKind::SecEdgar
    }

    /// Feeds are fetched in turn; a failing feed is skipped
    async fn fetch(&self) -> Result<Vec<NewsItem>, SourceError> {
        let mut items = Vec::new();

        for url in &self.feeds {
            let result = match get_text(self.http_client.get(url), "sec.gov").await {
                Ok(xml) => parse_feed(&xml, &self.cik_tickers),
                Err(e) => Err(e),
            };
            match result {
                Ok(batch) => {
                    debug!(feed = %url, count = batch.len(), "EDGAR feed fetched");
                    items.extend(batch);
                }
                Err(e) => warn!(feed = %url, error = %e, "EDGAR feed skipped"),
            }
        }

        Ok(items)
    }
}
