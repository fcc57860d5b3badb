//! Event classification and ticker enrichment
//!
//! EDGAR filings are classified from the `Item N.NN` codes in their summary.
//! Press items go through a keyword pre-classifier (English and German
//! phrases) and get tickers from company names, `(TICKER)` patterns and URL
//! slugs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

use crate::models::{NewsItem, Urgency};

static ITEM_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Item\s+(\d+\.\d+)").expect("valid regex"));
static TICKER_IN_PARENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((?P<t>[A-Z]{1,5})\)").expect("valid regex"));

/// Form 8-K item codes and the event they report
const ITEM_MAP: &[(&str, &str, Urgency)] = &[
    ("1.01", "mna", Urgency::High),
    ("1.02", "termination_material_agreement", Urgency::High),
    ("1.03", "bankruptcy", Urgency::High),
    ("2.01", "mna", Urgency::High),
    ("2.02", "earnings_surprise", Urgency::High),
    ("2.03", "new_debt_obligation", Urgency::High),
    ("2.04", "triggering_event_debt", Urgency::High),
    ("2.05", "impairment", Urgency::High),
    ("2.06", "restructuring_costs", Urgency::Med),
    ("3.02", "unregistered_sale", Urgency::Med),
    ("3.03", "security_holder_rights_change", Urgency::Med),
    ("4.01", "auditor_change", Urgency::High),
    ("4.02", "non_reliance", Urgency::High),
    ("5.02", "ceo_exit", Urgency::High),
    ("5.03", "other_events", Urgency::Low),
    ("5.07", "shareholder_vote", Urgency::Low),
    ("7.01", "reg_fd", Urgency::Med),
    ("8.01", "other_events", Urgency::Med),
];

/// Keyword groups, checked in order; the first group with a hit wins
const KEYWORD_MAP: &[(&str, &[&str])] = &[
    (
        "ceo_exit",
        &[
            "ceo resigns", "steps down", "resigns as ceo", "appointed ceo", "names ceo",
            "tritt zurück", "rücktritt", "scheidet aus", "neuer ceo", "zum ceo ernannt",
        ],
    ),
    (
        "mna",
        &[
            "acquires", "acquisition", "to buy", "merger", "merges with", "takeover",
            "übernahme", "akquisition", "kauft", "fusion", "mehrheitsbeteiligung",
        ],
    ),
    (
        "earnings_surprise",
        &[
            "beats estimates", "misses estimates", "tops forecasts", "cuts outlook", "raises outlook",
            "guidance", "übertrifft erwartungen", "verfehlt erwartungen", "prognose",
            "ausblick angehoben", "ausblick gesenkt",
        ],
    ),
    (
        "rating_change",
        &[
            "downgrades", "upgrades", "cut to", "raised to", "initiated at",
            "abstufung", "hochstuft", "herabgestuft", "aufgestuft", "aufnahme der bewertung",
        ],
    ),
    (
        "geopolitics",
        &[
            "sanction", "tariff", "strike", "protest", "conflict", "attack",
            "sanktion", "zoll", "streik", "konflikt", "angriff",
        ],
    ),
    (
        "dividend_change",
        &["dividend", "buyback", "repurchase", "dividende", "aktienrückkauf", "rückkaufprogramm"],
    ),
    ("bankruptcy", &["bankruptcy", "chapter 11", "insolvenz", "insolvenzverfahren"]),
];

const HIGH_URGENCY_EVENTS: &[&str] = &["ceo_exit", "mna", "earnings_surprise", "bankruptcy"];

/// Tickers accepted from `(TICKER)` patterns and URL slugs
const VALID_TICKERS: &[&str] = &[
    "FDX", "CRWD", "NVDA", "INTC", "ORCL", "ROO", "DRI", "AXP", "HYMTF", "NESN.SW", "NVO",
    "AAPL", "MSFT", "GOOGL", "AMZN", "META", "TSLA", "JPM", "BAC", "GS", "MS", "NFLX", "DIS",
];

/// Lowercase company names and their tickers
const NAME_TICKERS: &[(&str, &str)] = &[
    ("fedex", "FDX"),
    ("crowdstrike", "CRWD"),
    ("nvidia", "NVDA"),
    ("intel", "INTC"),
    ("oracle", "ORCL"),
    ("deliveroo", "ROO"),
    ("darden restaurants", "DRI"),
    ("american express", "AXP"),
    ("hyundai", "HYMTF"),
    ("nestlé", "NESN.SW"),
    ("novo nordisk", "NVO"),
];

/// Result of classifying an EDGAR filing summary
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilingClass {
    pub event_type: Option<String>,
    pub urgency: Option<Urgency>,
    /// All item codes found, in order
    pub items: Vec<String>,
}

/// Classify a filing from the item codes in its summary
///
/// Unknown codes count as low-urgency `other_events`. The most urgent code
/// wins; on a tie the first one found is kept.
pub fn classify_edgar_summary(summary: &str) -> FilingClass {
    let items: Vec<String> = ITEM_CODE
        .captures_iter(summary)
        .map(|c| c[1].to_string())
        .collect();

    let mut best: Option<(&str, Urgency)> = None;
    for code in &items {
        let (event, urgency) = ITEM_MAP
            .iter()
            .find(|(c, _, _)| c == code)
            .map(|(_, e, u)| (*e, *u))
            .unwrap_or(("other_events", Urgency::Low));
        if best.map_or(true, |(_, u)| urgency > u) {
            best = Some((event, urgency));
        }
    }

    FilingClass {
        event_type: best.map(|(e, _)| e.to_string()),
        urgency: best.map(|(_, u)| u),
        items,
    }
}

/// Apply the filing classification and CIK ticker lookup to an EDGAR item
pub fn classify_edgar(item: &mut NewsItem, summary: &str, cik_tickers: &HashMap<String, String>) {
    let class = classify_edgar_summary(summary);
    item.event_type = class.event_type;
    item.urgency = class.urgency;
    item.entities = class.items;

    if let Some(ticker) = item.cik.as_ref().and_then(|cik| cik_tickers.get(cik)) {
        item.tickers = vec![ticker.clone()];
    }
}

/// Keyword-based event guess for press items
///
/// EDGAR items are skipped. Existing event type and urgency are kept.
pub fn preclassify_keywords(item: &mut NewsItem) {
    if item.is_edgar() {
        return;
    }

    let text = format!("{} {}", item.headline, item.body_text).to_lowercase();
    let hit = KEYWORD_MAP
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)));

    if let Some((event, _)) = hit {
        if item.event_type.is_none() {
            item.event_type = Some(event.to_string());
        }
        if item.urgency.is_none() {
            item.urgency = Some(if HIGH_URGENCY_EVENTS.contains(event) {
                Urgency::High
            } else {
                Urgency::Med
            });
        }
    }
}

/// Fill in tickers for items that have none
pub fn enrich_tickers(item: &mut NewsItem) {
    if !item.tickers.is_empty() {
        return;
    }

    let headline = item.headline.to_lowercase();
    let mut found: BTreeSet<String> = NAME_TICKERS
        .iter()
        .filter(|(name, _)| headline.contains(name))
        .map(|(_, ticker)| ticker.to_string())
        .collect();

    found.extend(
        TICKER_IN_PARENS
            .captures_iter(&item.headline)
            .map(|c| c["t"].to_string())
            .filter(|t| VALID_TICKERS.contains(&t.as_str())),
    );

    found.extend(
        item.url
            .to_lowercase()
            .split('-')
            .map(str::to_uppercase)
            .filter(|part| VALID_TICKERS.contains(&part.as_str())),
    );

    item.tickers = found.into_iter().collect();
}
