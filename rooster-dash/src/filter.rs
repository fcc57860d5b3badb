//! Article filtering by tag, priority and age

use chrono::{DateTime, Duration, Utc};
use rooster_common::{Article, Priority};

/// Maximum look-back window in hours
pub const MAX_HOURS: u32 = 72;

/// Dashboard article filter
///
/// Empty `tags` or `priorities` lists do not restrict the result. Without
/// `hours` there is no age cutoff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub tags: Vec<String>,
    pub priorities: Vec<Priority>,
    /// Look-back window, at most [`MAX_HOURS`]
    pub hours: Option<u32>,
}

impl ArticleFilter {
    pub fn new(tags: Vec<String>, priorities: Vec<Priority>, hours: Option<u32>) -> Self {
        Self {
            tags,
            priorities,
            hours: hours.map(|h| h.min(MAX_HOURS)),
        }
    }

    pub fn matches(&self, article: &Article, cutoff: Option<DateTime<Utc>>) -> bool {
        if cutoff.is_some_and(|c| article.datetime < c) {
            return false;
        }
        let priority_match = self.priorities.is_empty() || self.priorities.contains(&article.priority);
        let tag_match = self.tags.is_empty() || article.tags.iter().any(|t| self.tags.contains(t));
        priority_match && tag_match
    }

    /// Matching articles, newest first
    pub fn apply(&self, articles: &[Article], now: DateTime<Utc>) -> Vec<Article> {
        let cutoff = self.hours.map(|h| now - Duration::hours(i64::from(h)));
        let mut result: Vec<Article> = articles
            .iter()
            .filter(|a| self.matches(a, cutoff))
            .cloned()
            .collect();
        sort_newest_first(&mut result);
        result
    }
}

pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.datetime.cmp(&a.datetime));
}
