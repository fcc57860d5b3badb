//! Data models stored in `db.json` and `approved.json`
//!
//! Field names follow the camelCase layout of the store files so that files
//! written by earlier tooling load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Editorial priority of an article
///
/// Serialized in English. The German labels used by the ingestion feed
/// (`Hoch`, `Mittel`, `Niedrig`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(alias = "Hoch", alias = "high")]
    High,
    #[serde(alias = "Mittel", alias = "medium", alias = "med")]
    Medium,
    #[serde(alias = "Niedrig", alias = "low")]
    Low,
}

impl Priority {
    /// Parse a priority from a query-string value (case-insensitive, English or German)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "high" | "hoch" => Some(Priority::High),
            "medium" | "med" | "mittel" => Some(Priority::Medium),
            "low" | "niedrig" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

/// A curated news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub url: String,
    /// Publication time (RFC 3339, UTC)
    pub datetime: DateTime<Utc>,
    pub priority: Priority,
    #[serde(default)]
    pub summary: String,
    /// Why the article matters for clients
    #[serde(default)]
    pub context: String,
    /// Pre-written text block used when compiling a draft
    #[serde(default)]
    pub draft_text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ingestion hash, used to avoid publishing the same item twice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Article {
    /// Source attribution for this article
    pub fn source_ref(&self) -> SourceRef {
        SourceRef {
            name: self.source.clone(),
            url: if self.url.is_empty() {
                None
            } else {
                Some(self.url.clone())
            },
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t == name)
    }
}

/// A filter tag known to the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
}

/// An email alert subscription
///
/// Empty `tags` or `priorities` lists match everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priorities: Vec<Priority>,
    /// Articles this subscriber has already been alerted about
    #[serde(default)]
    pub notified_article_ids: Vec<u64>,
}

impl Subscription {
    pub fn was_notified(&self, article_id: u64) -> bool {
        self.notified_article_ids.contains(&article_id)
    }
}

/// Source attribution attached to drafts and review items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Review workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewStatus::Pending => write!(f, "pending"),
            ReviewStatus::Approved => write!(f, "approved"),
            ReviewStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A compiled draft awaiting (or past) human review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    pub created_at: DateTime<Utc>,
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

/// An entry of the approved-text log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedText {
    pub id: u64,
    pub text: String,
    pub approved_at: DateTime<Utc>,
}

/// Complete contents of `db.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub reviews: Vec<ReviewItem>,
}

impl DashboardData {
    /// Case-insensitive tag lookup
    pub fn find_tag(&self, name: &str) -> Option<&Tag> {
        let needle = name.to_lowercase();
        self.tags.iter().find(|t| t.name.to_lowercase() == needle)
    }

    pub fn next_tag_id(&self) -> u64 {
        next_id(self.tags.iter().map(|t| t.id))
    }

    pub fn next_article_id(&self) -> u64 {
        next_id(self.articles.iter().map(|a| a.id))
    }

    pub fn next_subscription_id(&self) -> u64 {
        next_id(self.subscriptions.iter().map(|s| s.id))
    }

    pub fn next_review_id(&self) -> u64 {
        next_id(self.reviews.iter().map(|r| r.id))
    }
}

/// Next identifier for a collection: `max + 1`, or `1` when empty
pub fn next_id<I: IntoIterator<Item = u64>>(ids: I) -> u64 {
    ids.into_iter().max().map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_id_empty_and_gaps() {
        assert_eq!(next_id(Vec::<u64>::new()), 1);
        assert_eq!(next_id(vec![3, 1, 7]), 8);
    }

    #[test]
    fn test_priority_accepts_german_labels() {
        let p: Priority = serde_json::from_str("\"Hoch\"").unwrap();
        assert_eq!(p, Priority::High);
        let p: Priority = serde_json::from_str("\"Niedrig\"").unwrap();
        assert_eq!(p, Priority::Low);
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"Medium\"");
        assert_eq!(Priority::parse("mittel"), Some(Priority::Medium));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn test_article_camel_case_and_defaults() {
        let json = r#"{
            "id": 4,
            "title": "Fed holds rates",
            "source": "Reuters",
            "datetime": "2025-09-20T08:00:00Z",
            "priority": "High",
            "draftText": "Flash note"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.draft_text, "Flash note");
        assert!(article.tags.is_empty());
        assert!(article.fingerprint.is_none());

        let back = serde_json::to_value(&article).unwrap();
        assert_eq!(back["draftText"], "Flash note");
        assert!(back.get("fingerprint").is_none());
    }

    #[test]
    fn test_dashboard_data_missing_collections() {
        let data: DashboardData = serde_json::from_str(r#"{"tags": []}"#).unwrap();
        assert!(data.articles.is_empty());
        assert!(data.subscriptions.is_empty());
        assert!(data.reviews.is_empty());
    }

    #[test]
    fn test_find_tag_case_insensitive() {
        let data = DashboardData {
            tags: vec![Tag { id: 1, name: "Inflation".into() }],
            ..Default::default()
        };
        assert!(data.find_tag("inflation").is_some());
        assert!(data.find_tag("Zinsen").is_none());
    }
}
