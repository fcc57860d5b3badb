//! One ingestion run: fetch, dedupe, classify, score and filter

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::classify::{enrich_tickers, preclassify_keywords};
use crate::dedupe::dedupe;
use crate::models::NewsItem;
use crate::score::score_all;
use crate::sources::{NewsSource, SourceKind};

/// Default relevance threshold for `POST /ingest`
pub const DEFAULT_MIN_SCORE: f64 = 0.55;

/// Item counts per stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestCounts {
    pub sec_edgar: usize,
    pub marketaux: usize,
    pub newsapi: usize,
    pub total_deduped: usize,
    pub relevant: usize,
}

impl IngestCounts {
    fn record(&mut self, kind: SourceKind, count: usize) {
        match kind {
            SourceKind::SecEdgar => self.sec_edgar += count,
            SourceKind::MarketAux => self.marketaux += count,
            SourceKind::NewsApi => self.newsapi += count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub counts: IngestCounts,
    /// Relevant items, most confident first
    pub items: Vec<NewsItem>,
}

/// Fetch every source concurrently and keep items scoring at least `min_score`
///
/// A failing source contributes no items.
pub async fn run(
    sources: &[Box<dyn NewsSource>],
    watchlist: &HashSet<String>,
    min_score: f64,
) -> IngestReport {
    let results = join_all(sources.iter().map(|s| async move { (s.kind(), s.fetch().await) })).await;

    let mut counts = IngestCounts::default();
    let mut fetched = Vec::new();
    for (kind, result) in results {
        match result {
            Ok(items) => {
                info!(source = %kind, count = items.len(), "Source fetched");
                counts.record(kind, items.len());
                fetched.extend(items);
            }
            Err(e) => warn!(source = %kind, error = %e, "Source failed, continuing without it"),
        }
    }

    let mut items = dedupe(fetched);
    counts.total_deduped = items.len();

    for item in items.iter_mut() {
        enrich_tickers(item);
        preclassify_keywords(item);
    }
    score_all(&mut items, watchlist);

    let mut relevant: Vec<NewsItem> = items
        .into_iter()
        .filter(|i| i.confidence.unwrap_or_default() >= min_score)
        .collect();
    relevant.sort_by(|a, b| {
        b.confidence
            .unwrap_or_default()
            .total_cmp(&a.confidence.unwrap_or_default())
            .then_with(|| b.published_at.cmp(&a.published_at))
    });
    counts.relevant = relevant.len();

    info!(
        total_deduped = counts.total_deduped,
        relevant = counts.relevant,
        min_score,
        "Ingestion run complete"
    );

    IngestReport {
        counts,
        items: relevant,
    }
}
