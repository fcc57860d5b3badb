//! Relevance scoring and severity buckets

use std::collections::HashSet;

use crate::models::{NewsItem, Severity, Urgency};

pub const SEC_8K_WEIGHT: f64 = 0.45;
pub const SEC_10Q_WEIGHT: f64 = 0.30;
pub const SEC_10K_WEIGHT: f64 = 0.25;
pub const TIER1_PRESS_WEIGHT: f64 = 0.30;
pub const OTHER_PRESS_WEIGHT: f64 = 0.20;

pub const KEYWORD_NUDGE: f64 = 0.03;
pub const TICKER_PRESENT: f64 = 0.04;
pub const WATCHLIST_BOOST: f64 = 0.12;
pub const MAX_SCORE: f64 = 1.0;

const OTHER_EVENT_WEIGHT: f64 = 0.05;

const EVENT_WEIGHTS: &[(&str, f64)] = &[
    ("ceo_exit", 0.35),
    ("bankruptcy", 0.35),
    ("non_reliance", 0.35),
    ("earnings_surprise", 0.30),
    ("mna", 0.30),
    ("guidance_change", 0.20),
    ("rating_change", 0.20),
    ("geopolitics", 0.20),
    ("unregistered_sale", 0.15),
    ("dividend_change", 0.15),
    ("reg_fd", 0.10),
    ("other_events", OTHER_EVENT_WEIGHT),
];

/// Source name fragments of tier-1 financial press
const TIER1_SOURCES: &[&str] = &[
    "reuters", "bloomberg", "wsj", "ft", "cnbc", "marketwatch", "nzz", "handelszeitung",
    "handelsblatt", "faz", "wiwo", "boerse.ard", "tagesschau", "finanzen.net", "cash", "finews",
    "tagesanzeiger",
];

/// Headline terms that nudge the score up (applied once)
const NUDGE_KEYWORDS: &[&str] = &[
    "guidance", "resigns", "resignation", "appointed", "impairment", "non-reliance",
    "acquisition", "merger", "downgrade", "upgrade", "beats", "misses", "ausblick",
    "tritt zurück", "übernahme", "fusion", "abstufung", "hochstuft", "übertrifft", "verfehlt",
    "dividende", "aktienrückkauf", "insolvenz",
];

pub fn source_weight(item: &NewsItem) -> f64 {
    if item.is_edgar() {
        let form = item.headline.as_str();
        if form.starts_with("8-K") {
            SEC_8K_WEIGHT
        } else if form.starts_with("10-Q") {
            SEC_10Q_WEIGHT
        } else if form.starts_with("10-K") {
            SEC_10K_WEIGHT
        } else {
            OTHER_PRESS_WEIGHT
        }
    } else {
        let source = item.source.to_lowercase();
        if TIER1_SOURCES.iter().any(|t| source.contains(t)) {
            TIER1_PRESS_WEIGHT
        } else {
            OTHER_PRESS_WEIGHT
        }
    }
}

pub fn event_weight(event_type: Option<&str>) -> f64 {
    let event = event_type.unwrap_or("other_events");
    EVENT_WEIGHTS
        .iter()
        .find(|(name, _)| *name == event)
        .map_or(OTHER_EVENT_WEIGHT, |(_, w)| *w)
}

pub fn urgency_weight(urgency: Option<Urgency>) -> f64 {
    match urgency {
        Some(Urgency::High) => 0.15,
        Some(Urgency::Med) => 0.06,
        Some(Urgency::Low) | None => 0.0,
    }
}

/// Relevance score in `0.0..=1.0`
pub fn score_item(item: &NewsItem, watchlist: &HashSet<String>) -> f64 {
    let mut score = source_weight(item)
        + event_weight(item.event_type.as_deref())
        + urgency_weight(item.urgency);

    let headline = item.headline.to_lowercase();
    if NUDGE_KEYWORDS.iter().any(|kw| headline.contains(kw)) {
        score += KEYWORD_NUDGE;
    }
    if !item.tickers.is_empty() {
        score += TICKER_PRESENT;
    }
    if item.tickers.iter().any(|t| watchlist.contains(t)) {
        score += WATCHLIST_BOOST;
    }

    score.min(MAX_SCORE)
}

pub fn severity(score: f64) -> Severity {
    if score >= 0.80 {
        Severity::High
    } else if score >= 0.55 {
        Severity::Med
    } else {
        Severity::Low
    }
}

/// Score every item and set its confidence and severity
pub fn score_all(items: &mut [NewsItem], watchlist: &HashSet<String>) {
    for item in items.iter_mut() {
        let score = score_item(item, watchlist);
        item.confidence = Some(score);
        item.severity = Some(severity(score));
    }
}
