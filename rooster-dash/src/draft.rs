//! Draft compilation and the curator's draft session

use rooster_common::{Article, SourceRef};
use serde::Serialize;
use thiserror::Error;

use crate::services::combiner::{CombineError, TextCombiner};

/// Separator placed between text blocks of a plainly compiled draft
pub const DRAFT_SEPARATOR: &str = "\n\n---\n\n";

/// Draft text with its source attributions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledDraft {
    pub text: String,
    pub sources: Vec<SourceRef>,
}

/// Sources of the given articles, deduplicated by name (first occurrence wins)
pub fn unique_sources<'a, I>(articles: I) -> Vec<SourceRef>
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut sources: Vec<SourceRef> = Vec::new();
    for article in articles {
        if !sources.iter().any(|s| s.name == article.source) {
            sources.push(article.source_ref());
        }
    }
    sources
}

/// Join the draft texts of the selected articles
///
/// Articles are taken in store order, not selection order. Unknown ids are
/// ignored.
pub fn compile(articles: &[Article], ids: &[u64]) -> CompiledDraft {
    let selected: Vec<&Article> = articles.iter().filter(|a| ids.contains(&a.id)).collect();

    let text = selected
        .iter()
        .map(|a| a.draft_text.as_str())
        .collect::<Vec<_>>()
        .join(DRAFT_SEPARATOR);

    CompiledDraft {
        text,
        sources: unique_sources(selected),
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Article {0} not found")]
    UnknownArticle(u64),

    #[error("Text combination failed: {0}")]
    Combine(#[from] CombineError),
}

/// In-memory draft being assembled by the curator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSession {
    pub article_ids: Vec<u64>,
    pub text: String,
}

impl DraftSession {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn contains(&self, article_id: u64) -> bool {
        self.article_ids.contains(&article_id)
    }

    /// Add or remove an article
    ///
    /// Adding merges the article's draft text into the current text through
    /// `combiner`; if that fails the session is left unchanged. Removing
    /// recompiles the remaining selection by plain join.
    ///
    /// Returns `true` when the article was added.
    pub async fn toggle(
        &mut self,
        article_id: u64,
        articles: &[Article],
        combiner: &dyn TextCombiner,
    ) -> Result<bool, DraftError> {
        if self.contains(article_id) {
            self.article_ids.retain(|id| *id != article_id);
            self.text = compile(articles, &self.article_ids).text;
            return Ok(false);
        }

        let article = articles
            .iter()
            .find(|a| a.id == article_id)
            .ok_or(DraftError::UnknownArticle(article_id))?;

        let combined = combiner.combine(&self.text, &article.draft_text).await?;
        self.article_ids.push(article_id);
        self.text = combined;
        Ok(true)
    }

    /// Sources of the selected articles
    pub fn sources(&self, articles: &[Article]) -> Vec<SourceRef> {
        unique_sources(articles.iter().filter(|a| self.contains(a.id)))
    }

    pub fn clear(&mut self) {
        self.article_ids.clear();
        self.text.clear();
    }
}
