//! Text and timestamp normalization helpers

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<]+?>").expect("valid regex"));
static CIK_IN_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/edgar/data/(\d+)/").expect("valid regex"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

/// Remove HTML tags and surrounding whitespace
pub fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

/// Parse an API timestamp, accepting RFC 3339 and zone-less ISO forms (read as UTC)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a timestamp, falling back to the current time
pub fn timestamp_or_now(value: Option<&str>) -> DateTime<Utc> {
    value.and_then(parse_timestamp).unwrap_or_else(Utc::now)
}

/// SEC CIK from an EDGAR archive URL, without leading zeros
pub fn extract_cik(url: &str) -> Option<String> {
    CIK_IN_URL
        .captures(url)
        .map(|c| c[1].trim_start_matches('0').to_string())
        .filter(|cik| !cik.is_empty())
}

/// Split text into trimmed, non-empty sentences
pub fn sentences(text: &str) -> Vec<String> {
    let text = text.trim();
    let mut out = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        // keep the terminator, drop the whitespace
        let end = m.start() + 1;
        out.push(text[start..end].trim().to_string());
        start = m.end();
    }
    out.push(text[start..].trim().to_string());
    out.retain(|s| !s.is_empty());
    out
}

/// First sentence, cut to `max_chars` with an ellipsis
pub fn first_sentence(text: &str, max_chars: usize) -> String {
    let Some(first) = sentences(text).into_iter().next() else {
        return String::new();
    };
    if first.chars().count() > max_chars {
        let mut cut: String = first.chars().take(max_chars).collect();
        cut.push('…');
        cut
    } else {
        first
    }
}

/// At most `max_words` words and `max_chars` characters, without trailing punctuation
pub fn shorten_words(text: &str, max_words: usize, max_chars: usize) -> String {
    let joined = text.split_whitespace().take(max_words).collect::<Vec<_>>().join(" ");
    let cut = if joined.chars().count() > max_chars {
        let prefix: String = joined.chars().take(max_chars).collect();
        match prefix.rsplit_once(' ') {
            Some((head, _)) => format!("{}…", head),
            None => prefix,
        }
    } else {
        joined
    };
    cut.trim_matches(|c: char| " .:;-–—".contains(c)).to_string()
}
