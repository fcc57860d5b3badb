//! Cross-source deduplication

use std::collections::HashSet;

use crate::models::{fingerprint, NewsItem};

/// Drop repeated (source, url, headline) items, keeping the first occurrence
pub fn dedupe(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(fingerprint(&[&item.source, &item.url, &item.headline])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_first_occurrence_wins() {
        let mut first = NewsItem::new("Reuters", "https://r.com/a", "Fed holds", "first", Utc::now());
        first.tickers = vec!["X".into()];
        let second = NewsItem::new("Reuters", "https://r.com/a", "Fed holds", "second", Utc::now());
        let other = NewsItem::new("Bloomberg", "https://r.com/a", "Fed holds", "", Utc::now());

        let result = dedupe(vec![first, second, other]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].body_text, "first");
        assert_eq!(result[1].source, "Bloomberg");
    }
}
