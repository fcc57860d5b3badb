//! Publishing relevant items into the shared article store
//!
//! Items become dashboard [`Article`]s. Each article keeps the item id as its
//! fingerprint so a later run never publishes the same item twice.

use rooster_common::store::JsonStore;
use rooster_common::{Article, Priority};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::models::{NewsItem, Severity, SEC_EDGAR};
use crate::normalize::{first_sentence, sentences, shorten_words};

const SUMMARY_MAX_CHARS: usize = 280;
/// Summaries shorter than this fall back to the headline
const SUMMARY_MIN_CHARS: usize = 30;

/// Default "why it matters" line per event type
const CONTEXT_DEFAULTS: &[(&str, &str)] = &[
    ("ceo_exit", "Führungswechsel kann Strategie und Guidance verschieben; Nachfolge und Marktreaktion beobachten."),
    ("mna", "Bewertung von Käufer und Ziel hängt an Bedingungen, Verwässerung, Synergien und Kartellfreigabe."),
    ("earnings_surprise", "Abweichungen vom Konsens ändern Schätzungen und Bewertungen; Guidance entscheidend."),
    ("auditor_change", "Prüferwechsel kann Reporting- und Kontrollrisiken signalisieren; Glaubwürdigkeit kurzfristig belastet."),
    ("non_reliance", "Nichtverlassenserklärung erhöht Reporting- und Rechtsrisiken; mögliche Restatements."),
    ("bankruptcy", "Verfahrensausgang bestimmt Gläubigerrückflüsse und Eigenkapital; erste Maßnahmen beobachten."),
    ("dividend_change", "Kapitalrückflüsse signalisieren Bilanzqualität und Allokationsprioritäten."),
    ("rating_change", "Analystenstufen bewegen Flüsse, v. a. bei kleineren Caps; Begründung prüfen."),
    ("reg_fd", "Wesentliche FD-Offenlegung kann Erwartungen und Schätzungen verschieben."),
    ("geopolitics", "Politik- und Lieferkettenrisiken beeinflussen Sektormultiplikatoren und Nachfrage."),
];
const CONTEXT_FALLBACK: &str = "Potenzielle Relevanz für Titel/Sektor; Details verifizieren.";

/// Dashboard tag label per event type
const EVENT_TAGS: &[(&str, &str)] = &[
    ("central_bank", "Geldpolitik"),
    ("earnings_surprise", "Ergebnisse"),
    ("ceo_exit", "Management"),
    ("mna", "M&A"),
    ("rating_change", "Analystenrating"),
    ("dividend_change", "Kapitalrückführungen"),
    ("bankruptcy", "Insolvenz"),
    ("regulatory", "Regulierung"),
    ("sector_shock", "Sektor"),
];
const EVENT_TAG_FALLBACK: &str = "Sonstiges";

pub fn event_tag(event_type: Option<&str>) -> &'static str {
    let event = event_type.unwrap_or_default().to_lowercase();
    EVENT_TAGS
        .iter()
        .find(|(e, _)| *e == event)
        .map_or(EVENT_TAG_FALLBACK, |(_, tag)| tag)
}

pub fn event_context(event_type: Option<&str>) -> &'static str {
    let event = event_type.unwrap_or_default();
    CONTEXT_DEFAULTS
        .iter()
        .find(|(e, _)| *e == event)
        .map_or(CONTEXT_FALLBACK, |(_, text)| text)
}

pub fn priority_for(severity: Option<Severity>) -> Priority {
    match severity {
        Some(Severity::High) => Priority::High,
        Some(Severity::Med) => Priority::Medium,
        Some(Severity::Low) | None => Priority::Low,
    }
}

fn display_source(source: &str) -> String {
    match source {
        SEC_EDGAR => "SEC EDGAR".to_string(),
        "marketaux" => "MarketAux".to_string(),
        "newsapi" => "NewsAPI".to_string(),
        other => other.to_string(),
    }
}

/// Map an item to an article; `id` is assigned by the caller
pub fn to_article(item: &NewsItem, id: u64) -> Article {
    let mut summary = first_sentence(&item.body_text, SUMMARY_MAX_CHARS);
    if summary.chars().count() < SUMMARY_MIN_CHARS {
        summary = item.headline.clone();
    }

    let context = event_context(item.event_type.as_deref()).to_string();
    let lead = sentences(&item.body_text)
        .into_iter()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ");
    let lead = if lead.chars().count() < SUMMARY_MIN_CHARS {
        summary.clone()
    } else {
        lead
    };

    Article {
        id,
        title: shorten_words(&item.headline, 12, 90),
        source: display_source(&item.source),
        url: item.url.clone(),
        datetime: item.published_at,
        priority: priority_for(item.severity),
        summary,
        draft_text: format!("{}\n\n{}", lead, context),
        context,
        tags: vec![event_tag(item.event_type.as_deref()).to_string()],
        fingerprint: Some(item.id.clone()),
    }
}

/// Append items not yet in the store; returns the number published
pub async fn publish(store: &JsonStore, items: &[NewsItem]) -> rooster_common::Result<usize> {
    let mut txn = store.begin().await?;

    let mut known: HashSet<String> = txn
        .data
        .articles
        .iter()
        .filter_map(|a| a.fingerprint.clone())
        .collect();

    let mut published = 0;
    for item in items {
        if !known.insert(item.id.clone()) {
            debug!(fingerprint = %item.id, "Item already published");
            continue;
        }
        let id = txn.data.next_article_id();
        txn.data.articles.push(to_article(item, id));
        published += 1;
    }

    if published > 0 {
        txn.commit().await?;
    }
    info!(published, offered = items.len(), "Published ingested items");
    Ok(published)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn item(headline: &str, body: &str, event: Option<&str>, severity: Severity) -> NewsItem {
        let mut item = NewsItem::new("Reuters", "https://reuters.com/x", headline, body, Utc::now());
        item.event_type = event.map(str::to_string);
        item.severity = Some(severity);
        item
    }

    #[test]
    fn test_event_labels() {
        assert_eq!(event_tag(Some("mna")), "M&A");
        assert_eq!(event_tag(Some("EARNINGS_SURPRISE")), "Ergebnisse");
        assert_eq!(event_tag(Some("impairment")), "Sonstiges");
        assert_eq!(event_tag(None), "Sonstiges");
        assert_eq!(event_context(Some("unknown")), CONTEXT_FALLBACK);
    }

    #[test]
    fn test_to_article() {
        let it = item(
            "Acme agrees to buy Widget in an all-stock deal valued at twelve billion dollars",
            "Acme Corp said on Monday it will acquire Widget Inc. The deal is expected to close in Q3. Shares rose.",
            Some("mna"),
            Severity::High,
        );
        let article = to_article(&it, 7);

        assert_eq!(article.id, 7);
        assert_eq!(article.priority, Priority::High);
        assert_eq!(article.title, "Acme agrees to buy Widget in an all-stock deal valued at twelve");
        assert_eq!(article.summary, "Acme Corp said on Monday it will acquire Widget Inc.");
        assert_eq!(article.tags, vec!["M&A"]);
        assert_eq!(article.fingerprint.as_deref(), Some(it.id.as_str()));
        assert!(article
            .draft_text
            .starts_with("Acme Corp said on Monday it will acquire Widget Inc. The deal is expected to close in Q3.\n\n"));
        assert!(article.draft_text.ends_with(&article.context));
    }

    #[test]
    fn test_short_body_falls_back_to_headline() {
        let it = item("Fed holds rates steady", "Short.", None, Severity::Med);
        let article = to_article(&it, 1);
        assert_eq!(article.summary, "Fed holds rates steady");
        assert_eq!(article.priority, Priority::Medium);
        assert_eq!(article.draft_text, format!("Fed holds rates steady\n\n{}", CONTEXT_FALLBACK));
    }

    #[tokio::test]
    async fn test_publish_skips_known_fingerprints() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::in_root(dir.path());

        let a = item("First headline here", "", None, Severity::Low);
        let b = item("Second headline here", "", None, Severity::Low);

        assert_eq!(publish(&store, &[a.clone(), a.clone()]).await.unwrap(), 1);
        assert_eq!(publish(&store, &[a, b]).await.unwrap(), 1);

        let data = store.load().await.unwrap();
        let ids: Vec<u64> = data.articles.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(data.articles[1].title, "Second headline here");
    }
}
