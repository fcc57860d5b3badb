//! Tag matching engine
//!
//! Tags are attached to articles by a case-insensitive whole-word search over
//! the article's text fields. Subscriptions are matched against the resulting
//! tag sets and the article priority.

use regex::{Regex, RegexBuilder};
use rooster_common::{Article, Subscription};

/// Case-insensitive whole-word pattern for a tag name
///
/// The name is escaped, so punctuation in names (`S&P`, `C++`) is literal.
/// A word boundary is only required on a side where the name begins or ends
/// with a word character.
pub fn tag_pattern(name: &str) -> Result<Regex, regex::Error> {
    let name = name.trim();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let start = if name.chars().next().is_some_and(is_word) { r"\b" } else { "" };
    let end = if name.chars().last().is_some_and(is_word) { r"\b" } else { "" };

    RegexBuilder::new(&format!("{}{}{}", start, regex::escape(name), end))
        .case_insensitive(true)
        .build()
}

/// Searchable text of an article: title, summary, context and draft text
pub fn article_text(article: &Article) -> String {
    format!(
        "{} {} {} {}",
        article.title, article.summary, article.context, article.draft_text
    )
}

/// Attach tag `name` to every article whose text matches it
///
/// Articles that already carry the tag are left untouched. Returns the ids of
/// all articles carrying the tag after the pass, in store order.
pub fn apply_tag(articles: &mut [Article], name: &str) -> Result<Vec<u64>, regex::Error> {
    let pattern = tag_pattern(name)?;
    let mut matched = Vec::new();

    for article in articles.iter_mut() {
        if !article.has_tag(name) && pattern.is_match(&article_text(article)) {
            article.tags.push(name.to_string());
        }
        if article.has_tag(name) {
            matched.push(article.id);
        }
    }

    Ok(matched)
}

/// Whether an article satisfies a subscription's criteria
///
/// An empty priority list or tag list matches everything; otherwise the
/// article priority must be listed and at least one tag must overlap.
pub fn subscription_matches(article: &Article, subscription: &Subscription) -> bool {
    let priority_match = subscription.priorities.is_empty()
        || subscription.priorities.contains(&article.priority);
    let tag_match = subscription.tags.is_empty()
        || subscription.tags.iter().any(|tag| article.has_tag(tag));
    priority_match && tag_match
}

/// A (subscription, article) pair that still needs an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNotification {
    pub subscription_index: usize,
    pub article_index: usize,
}

/// All matching pairs whose article has not been sent to the subscriber yet
///
/// Ordered article-major: every subscriber for the first article, then the
/// second article, and so on.
pub fn pending_notifications(
    articles: &[Article],
    subscriptions: &[Subscription],
) -> Vec<PendingNotification> {
    let mut pending = Vec::new();

    for (article_index, article) in articles.iter().enumerate() {
        for (subscription_index, subscription) in subscriptions.iter().enumerate() {
            if !subscription.was_notified(article.id) && subscription_matches(article, subscription) {
                pending.push(PendingNotification {
                    subscription_index,
                    article_index,
                });
            }
        }
    }

    pending
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use rooster_common::Priority;

    pub(crate) fn article(id: u64, title: &str, priority: Priority, tags: &[&str]) -> Article {
        Article {
            id,
            title: title.to_string(),
            source: "Reuters".to_string(),
            url: format!("https://example.com/{}", id),
            datetime: Utc::now(),
            priority,
            summary: String::new(),
            context: String::new(),
            draft_text: format!("Draft {}", id),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            fingerprint: None,
        }
    }

    fn subscription(id: u64, tags: &[&str], priorities: &[Priority], notified: &[u64]) -> Subscription {
        Subscription {
            id,
            email: format!("user{}@example.com", id),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            priorities: priorities.to_vec(),
            notified_article_ids: notified.to_vec(),
        }
    }

    #[test]
    fn test_tag_pattern_is_whole_word_and_case_insensitive() {
        let pattern = tag_pattern("Fed").unwrap();
        assert!(pattern.is_match("The fed signals a shift"));
        assert!(pattern.is_match("FED: rates on hold"));
        assert!(!pattern.is_match("Federal Reserve holds rates"));
    }

    #[test]
    fn test_tag_pattern_escapes_metacharacters() {
        let pattern = tag_pattern("S.P").unwrap();
        assert!(pattern.is_match("the S.P index"));
        assert!(!pattern.is_match("the SXP index"));
    }

    #[test]
    fn test_tag_pattern_trailing_symbols() {
        let pattern = tag_pattern("C++").unwrap();
        assert!(pattern.is_match("Rewriting the engine in C++ today"));
        assert!(!pattern.is_match("ABC++"));
    }

    #[test]
    fn test_apply_tag_searches_all_text_fields() {
        let mut articles = vec![
            article(1, "Inflation surprises", Priority::High, &[]),
            article(2, "Oil prices", Priority::Low, &[]),
            article(3, "Bond yields", Priority::Medium, &[]),
        ];
        articles[2].context = "Higher inflation expectations push yields up".to_string();

        let matched = apply_tag(&mut articles, "inflation").unwrap();
        assert_eq!(matched, vec![1, 3]);
        assert_eq!(articles[0].tags, vec!["inflation"]);
        assert!(articles[1].tags.is_empty());
    }

    #[test]
    fn test_apply_tag_is_idempotent() {
        let mut articles = vec![article(1, "Inflation surprises", Priority::High, &["inflation"])];
        let matched = apply_tag(&mut articles, "inflation").unwrap();
        assert_eq!(matched, vec![1]);
        assert_eq!(articles[0].tags.len(), 1);
    }

    #[test]
    fn test_subscription_empty_criteria_match_everything() {
        let a = article(1, "x", Priority::Low, &[]);
        assert!(subscription_matches(&a, &subscription(1, &[], &[], &[])));
    }

    #[test]
    fn test_subscription_requires_priority_and_tag() {
        let a = article(1, "x", Priority::High, &["Geopolitics"]);
        assert!(subscription_matches(&a, &subscription(1, &["Geopolitics"], &[Priority::High], &[])));
        assert!(!subscription_matches(&a, &subscription(2, &["Geopolitics"], &[Priority::Low], &[])));
        assert!(!subscription_matches(&a, &subscription(3, &["Inflation"], &[], &[])));
    }

    #[test]
    fn test_pending_skips_already_notified() {
        let articles = vec![
            article(1, "a", Priority::High, &["Fed"]),
            article(2, "b", Priority::High, &["Fed"]),
        ];
        let subs = vec![
            subscription(1, &["Fed"], &[], &[1]),
            subscription(2, &[], &[Priority::High], &[]),
        ];

        let pending = pending_notifications(&articles, &subs);
        let pairs: Vec<(u64, u64)> = pending
            .iter()
            .map(|p| (articles[p.article_index].id, subs[p.subscription_index].id))
            .collect();
        assert_eq!(pairs, vec![(1, 2), (2, 1), (2, 2)]);
    }
}
