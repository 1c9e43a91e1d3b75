//! Decision strategies: approve or reject a book that passed the filters.

use crate::catalog::Book;
use crate::pipeline::types::Decision;

/// Pluggable approve/reject rule.
///
/// Any `Fn(&Book) -> Decision` is a strategy, so tests and future model-backed
/// deciders can be swapped in without touching the pipeline.
pub trait DecisionStrategy: Send + Sync {
    fn decide(&self, book: &Book) -> Decision;
}

impl<F> DecisionStrategy for F
where
    F: Fn(&Book) -> Decision + Send + Sync,
{
    fn decide(&self, book: &Book) -> Decision {
        self(book)
    }
}

/// Rejects companion books (study guides, summaries) by title keyword.
#[derive(Debug, Clone)]
pub struct KeywordDecision {
    reject_terms: Vec<String>,
}

impl KeywordDecision {
    pub fn new<I, S>(reject_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reject_terms: reject_terms
                .into_iter()
                .map(|s| s.into().to_lowercase())
                .collect(),
        }
    }
}

impl Default for KeywordDecision {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_REJECT_TERMS.iter().copied())
    }
}

impl DecisionStrategy for KeywordDecision {
    fn decide(&self, book: &Book) -> Decision {
        let title = book.title().to_lowercase();
        if self.reject_terms.iter().any(|t| title.contains(t.as_str())) {
            Decision::Reject
        } else {
            Decision::Approve
        }
    }
}
