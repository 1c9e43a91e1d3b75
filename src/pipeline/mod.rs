//! Book processing pipeline.
//!
//! Every fetched book flows through:
//! 1. `FilterChain::evaluate()` — language, script, spam, freshness, editions
//! 2. `MemoryStore::contains()` — at most one decision per catalog key
//! 3. `DecisionStrategy::decide()` — approve/reject
//! 4. `Notifier::notify()` — approvals only

pub mod decision;
pub mod processor;
pub mod rules;
pub mod types;

pub use decision::{DecisionStrategy, KeywordDecision};
pub use processor::{Monitor, MonitorDeps};
pub use rules::{FilterChain, FilterRejection};
pub use types::{Decision, EvaluationRecord, RunSummary};
