//! Shared types for the book pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ── Decision ────────────────────────────────────────────────────────

/// Outcome of the decision strategy for one book.
///
/// Persisted as `"YES"` / `"NO"` to stay readable by older state files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "YES")]
    Approve,
    #[serde(rename = "NO")]
    Reject,
}

impl Decision {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approve)
    }
}

// ── Evaluation record ───────────────────────────────────────────────

/// What the monitor remembers about a book it has decided on.
///
/// Written once and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub title: Option<String>,
    pub genre: String,
    #[serde(rename = "ai_decision")]
    pub decision: Decision,
    /// True when a notification was sent for this book.
    pub notified: bool,
    /// Local wall-clock time of the evaluation.
    pub evaluated_at: NaiveDateTime,
}

impl EvaluationRecord {
    pub fn new(
        title: Option<String>,
        genre: impl Into<String>,
        decision: Decision,
        evaluated_at: NaiveDateTime,
    ) -> Self {
        Self {
            title,
            genre: genre.into(),
            decision,
            notified: decision.is_approved(),
            evaluated_at,
        }
    }
}

// ── Run summary ─────────────────────────────────────────────────────

/// Counters for a single monitor run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub genres_checked: usize,
    /// Genres whose fetch failed and were skipped.
    pub genres_failed: usize,
    pub fetched: usize,
    pub filtered_out: usize,
    /// Books without a catalog key.
    pub missing_key: usize,
    pub already_seen: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl RunSummary {
    /// Number of books that reached the decision strategy.
    pub fn evaluated(&self) -> usize {
        self.approved + self.rejected
    }

    /// Add another summary's counters into this one.
    pub fn merge(&mut self, other: &RunSummary) {
        self.genres_checked += other.genres_checked;
        self.genres_failed += other.genres_failed;
        self.fetched += other.fetched;
        self.filtered_out += other.filtered_out;
        self.missing_key += other.missing_key;
        self.already_seen += other.already_seen;
        self.approved += other.approved;
        self.rejected += other.rejected;
    }
}
