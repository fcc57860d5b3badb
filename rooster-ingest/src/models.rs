//! Normalized news items produced by the ingestion pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::normalize::strip_html;

/// Maximum stored body length in characters
pub const MAX_BODY_CHARS: usize = 8000;

/// Source id of SEC EDGAR filings
pub const SEC_EDGAR: &str = "sec_edgar";

/// Urgency of an event, as derived from filing items or keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Med,
    High,
}

/// Severity bucket of a scored item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Med,
    High,
}

/// First 16 hex chars of SHA-256 over the non-empty parts, concatenated
pub fn fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts.iter().filter(|p| !p.is_empty()) {
        hasher.update(part.as_bytes());
    }
    let mut hash = format!("{:x}", hasher.finalize());
    hash.truncate(16);
    hash
}

/// A news item from any source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Fingerprint of (source, url, headline)
    pub id: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub url: String,
    pub headline: String,
    pub body_text: String,
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Filing item codes for EDGAR entries
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cik: Option<String>,
    pub event_type: Option<String>,
    pub urgency: Option<Urgency>,
    /// Relevance score in `0.0..=1.0`
    pub confidence: Option<f64>,
    pub severity: Option<Severity>,
}

impl NewsItem {
    /// Build an unclassified item; the body is HTML-stripped and capped
    pub fn new(source: &str, url: &str, headline: &str, body: &str, published_at: DateTime<Utc>) -> Self {
        let headline = headline.trim();
        Self {
            id: fingerprint(&[source, url, headline]),
            published_at,
            source: source.to_string(),
            url: url.to_string(),
            headline: headline.to_string(),
            body_text: strip_html(body).chars().take(MAX_BODY_CHARS).collect(),
            tickers: Vec::new(),
            entities: Vec::new(),
            cik: None,
            event_type: None,
            urgency: None,
            confidence: None,
            severity: None,
        }
    }

    pub fn is_edgar(&self) -> bool {
        self.source.eq_ignore_ascii_case(SEC_EDGAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_skips_empty_parts() {
        assert_eq!(fingerprint(&["a", "", "b"]), fingerprint(&["ab"]));
        assert_eq!(fingerprint(&["x"]).len(), 16);
        // sha256("abc")
        assert_eq!(fingerprint(&["abc"]), "ba7816bf8f01cfea");
    }

    #[test]
    fn test_new_item_cleans_fields() {
        let body = format!("<p>{}</p>", "x".repeat(MAX_BODY_CHARS + 10));
        let item = NewsItem::new("reuters", "https://r.com/a", "  Headline  ", &body, Utc::now());
        assert_eq!(item.headline, "Headline");
        assert_eq!(item.body_text.len(), MAX_BODY_CHARS);
        assert_eq!(item.id, fingerprint(&["reuters", "https://r.com/a", "Headline"]));
        assert!(!item.is_edgar());
    }

    #[test]
    fn test_serialized_field_names() {
        let mut item = NewsItem::new(SEC_EDGAR, "u", "h", "", Utc::now());
        item.urgency = Some(Urgency::Med);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["urgency"], "med");
        assert!(json.get("publishedAt").is_some());
        assert!(json.get("bodyText").is_some());
        assert!(json.get("cik").is_none());
    }
}
