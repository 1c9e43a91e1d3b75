//! Monitor run — polls every genre once and notifies on new approvals.
//!
//! Flow per genre:
//! 1. `Catalog::fetch_recent()` — failures are logged and the genre skipped
//! 2. `FilterChain` — drops non-English, spam and stale entries
//! 3. `MemoryStore` — books seen before are never decided again
//! 4. `DecisionStrategy` — approve/reject
//! 5. `Notifier` — only for approvals; a send failure aborts the run

use chrono::{Datelike, Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::catalog::{Book, Catalog};
use crate::channels::Notifier;
use crate::config::MonitorConfig;
use crate::error::{ConfigError, Result};
use crate::pipeline::decision::DecisionStrategy;
use crate::pipeline::rules::FilterChain;
use crate::pipeline::types::{EvaluationRecord, RunSummary};
use crate::store::MemoryStore;

/// Collaborators the monitor drives.
pub struct MonitorDeps {
    pub catalog: Box<dyn Catalog>,
    pub decider: Box<dyn DecisionStrategy>,
    pub notifier: Box<dyn Notifier>,
}

/// Single-pass book monitor.
pub struct Monitor {
    genres: Vec<String>,
    filters: FilterChain,
    deps: MonitorDeps,
}

impl Monitor {
    /// Create a monitor using the local clock's current year.
    pub fn new(config: &MonitorConfig, deps: MonitorDeps) -> Result<Self> {
        Self::for_year(config, deps, Local::now().year())
    }

    /// Create a monitor that treats `current_year` as "now" for freshness.
    pub fn for_year(config: &MonitorConfig, deps: MonitorDeps, current_year: i32) -> Result<Self> {
        let filters = FilterChain::new(&config.filters, current_year).map_err(|e| {
            ConfigError::InvalidValue {
                key: "BOOK_MONITOR_DENYLIST".into(),
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            genres: config.genres.clone(),
            filters,
            deps,
        })
    }

    /// Check every configured genre, recording results in `memory`.
    ///
    /// Does not save `memory`; the caller persists it once the run succeeds.
    pub async fn run(&self, memory: &mut MemoryStore) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for genre in &self.genres {
            let genre_summary = self.check_genre(genre, memory).await?;
            summary.merge(&genre_summary);
        }

        info!(
            genres = summary.genres_checked,
            failed = summary.genres_failed,
            fetched = summary.fetched,
            filtered = summary.filtered_out,
            seen = summary.already_seen,
            approved = summary.approved,
            rejected = summary.rejected,
            "Run finished"
        );
        Ok(summary)
    }

    /// Check a single genre and return its counters.
    pub async fn check_genre(&self, genre: &str, memory: &mut MemoryStore) -> Result<RunSummary> {
        let mut summary = RunSummary {
            genres_checked: 1,
            ..Default::default()
        };

        let books = match self.deps.catalog.fetch_recent(genre).await {
            Ok(books) => books,
            Err(e) => {
                warn!(genre = %genre, "Failed to fetch genre: {e}");
                summary.genres_failed = 1;
                return Ok(summary);
            }
        };
        summary.fetched = books.len();

        for book in &books {
            if !self.filters.passes(book) {
                summary.filtered_out += 1;
                continue;
            }

            let Some(key) = book.key.as_deref() else {
                debug!(title = %book.title(), "Skipping book without catalog key");
                summary.missing_key += 1;
                continue;
            };

            if memory.contains(key) {
                debug!(key = %key, "Already evaluated, skipping");
                summary.already_seen += 1;
                continue;
            }

            self.evaluate(key, book, genre, memory, &mut summary).await?;
        }

        info!(
            genre = %genre,
            fetched = summary.fetched,
            filtered = summary.filtered_out,
            seen = summary.already_seen,
            approved = summary.approved,
            rejected = summary.rejected,
            "Genre checked"
        );
        Ok(summary)
    }

    async fn evaluate(
        &self,
        key: &str,
        book: &Book,
        genre: &str,
        memory: &mut MemoryStore,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let decision = self.deps.decider.decide(book);
        let now: NaiveDateTime = Local::now().naive_local();

        debug!(key = %key, decision = decision.label(), "Decided");
        memory.record(
            key,
            EvaluationRecord::new(book.title.clone(), genre, decision, now),
        );

        if decision.is_approved() {
            summary.approved += 1;
            info!(genre = %genre, key = %key, "Approved {genre} book: {}", book.title());
            self.deps.notifier.notify(book, genre, now).await?;
        } else {
            summary.rejected += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{Error, FetchError, NotifyError};
    use crate::pipeline::decision::KeywordDecision;
    use crate::pipeline::types::Decision;

    const YEAR: i32 = 2026;

    /// Catalog stub: fixed books per genre, missing genres return HTTP 500.
    struct StubCatalog {
        books: HashMap<String, Vec<Book>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Catalog for StubCatalog {
        async fn fetch_recent(&self, genre: &str) -> std::result::Result<Vec<Book>, FetchError> {
            self.calls.lock().unwrap().push(genre.to_string());
            self.books.get(genre).cloned().ok_or(FetchError::Status {
                genre: genre.to_string(),
                status: 500,
            })
        }
    }

    /// Notifier stub that records (key, genre) pairs, optionally failing.
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<(String, String)>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(
            &self,
            book: &Book,
            genre: &str,
            _detected_at: NaiveDateTime,
        ) -> std::result::Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::SendFailed("relay down".into()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((book.key.clone().unwrap_or_default(), genre.to_string()));
            Ok(())
        }
    }

    fn dragon() -> Book {
        Book {
            key: Some("/works/OL1".into()),
            title: Some("Dragon's Fire".into()),
            author_name: vec!["A. Writer".into()],
            first_publish_year: Some(YEAR),
            edition_count: Some(5),
            language: Some(vec!["eng".into()]),
        }
    }

    fn config(genres: &[&str]) -> MonitorConfig {
        MonitorConfig {
            genres: genres.iter().map(|g| g.to_string()).collect(),
            ..MonitorConfig::default()
        }
    }

    struct Harness {
        monitor: Monitor,
        sent: Arc<Mutex<Vec<(String, String)>>>,
        calls: Arc<Mutex<Vec<String>>>,
        decisions: Arc<Mutex<usize>>,
    }

    fn harness(genres: &[&str], books: &[(&str, Vec<Book>)], fail_send: bool) -> Harness {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let decisions = Arc::new(Mutex::new(0usize));

        let counter = Arc::clone(&decisions);
        let keyword = KeywordDecision::default();
        let decider = move |book: &Book| {
            *counter.lock().unwrap() += 1;
            keyword.decide(book)
        };

        let deps = MonitorDeps {
            catalog: Box::new(StubCatalog {
                books: books
                    .iter()
                    .map(|(g, b)| (g.to_string(), b.clone()))
                    .collect(),
                calls: Arc::clone(&calls),
            }),
            decider: Box::new(decider),
            notifier: Box::new(RecordingNotifier {
                sent: Arc::clone(&sent),
                fail: fail_send,
            }),
        };

        Harness {
            monitor: Monitor::for_year(&config(genres), deps, YEAR).unwrap(),
            sent,
            calls,
            decisions,
        }
    }

    #[tokio::test]
    async fn approved_book_is_notified_and_recorded() {
        let h = harness(&["fantasy"], &[("fantasy", vec![dragon()])], false);
        let mut memory = MemoryStore::new("unused.json");

        let summary = h.monitor.run(&mut memory).await.unwrap();

        assert_eq!(summary.approved, 1);
        assert_eq!(
            *h.sent.lock().unwrap(),
            vec![("/works/OL1".to_string(), "fantasy".to_string())]
        );
        assert_eq!(memory.len(), 1);
        let record = memory.get("/works/OL1").unwrap();
        assert_eq!(record.decision, Decision::Approve);
        assert!(record.notified);
        assert_eq!(record.genre, "fantasy");
        assert_eq!(record.title.as_deref(), Some("Dragon's Fire"));
    }

    #[tokio::test]
    async fn second_run_skips_known_books() {
        let h = harness(&["fantasy"], &[("fantasy", vec![dragon()])], false);
        let mut memory = MemoryStore::new("unused.json");

        h.monitor.run(&mut memory).await.unwrap();
        let summary = h.monitor.run(&mut memory).await.unwrap();

        assert_eq!(summary.already_seen, 1);
        assert_eq!(summary.evaluated(), 0);
        assert_eq!(*h.decisions.lock().unwrap(), 1);
        assert_eq!(h.sent.lock().unwrap().len(), 1);
        assert_eq!(memory.len(), 1);
    }

    #[tokio::test]
    async fn rejected_book_is_recorded_without_notification() {
        let guide = Book {
            key: Some("/works/OL2".into()),
            title: Some("Dragon's Fire: A Reader's Guide".into()),
            ..dragon()
        };
        let h = harness(&["fantasy"], &[("fantasy", vec![guide])], false);
        let mut memory = MemoryStore::new("unused.json");

        let summary = h.monitor.run(&mut memory).await.unwrap();

        assert_eq!(summary.rejected, 1);
        assert!(h.sent.lock().unwrap().is_empty());
        let record = memory.get("/works/OL2").unwrap();
        assert_eq!(record.decision, Decision::Reject);
        assert!(!record.notified);
    }

    #[tokio::test]
    async fn filtered_books_never_reach_the_decider() {
        let books = vec![
            Book {
                key: Some("/works/A".into()),
                language: None,
                ..dragon()
            },
            Book {
                key: Some("/works/B".into()),
                title: Some("火の竜".into()),
                ..dragon()
            },
            Book {
                key: Some("/works/C".into()),
                edition_count: Some(1),
                ..dragon()
            },
            Book {
                key: Some("/works/D".into()),
                first_publish_year: Some(YEAR - 5),
                ..dragon()
            },
        ];
        let h = harness(&["fantasy"], &[("fantasy", books)], false);
        let mut memory = MemoryStore::new("unused.json");

        let summary = h.monitor.run(&mut memory).await.unwrap();

        assert_eq!(summary.fetched, 4);
        assert_eq!(summary.filtered_out, 4);
        assert_eq!(*h.decisions.lock().unwrap(), 0);
        assert!(h.sent.lock().unwrap().is_empty());
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn failing_genre_does_not_stop_the_run() {
        let h = harness(
            &["horror", "fantasy"],
            &[("fantasy", vec![dragon()])],
            false,
        );
        let mut memory = MemoryStore::new("unused.json");

        let summary = h.monitor.run(&mut memory).await.unwrap();

        assert_eq!(*h.calls.lock().unwrap(), vec!["horror", "fantasy"]);
        assert_eq!(summary.genres_checked, 2);
        assert_eq!(summary.genres_failed, 1);
        assert_eq!(summary.approved, 1);
    }

    #[tokio::test]
    async fn book_without_key_is_skipped() {
        let keyless = Book {
            key: None,
            ..dragon()
        };
        let h = harness(&["fantasy"], &[("fantasy", vec![keyless])], false);
        let mut memory = MemoryStore::new("unused.json");

        let summary = h.monitor.run(&mut memory).await.unwrap();

        assert_eq!(summary.missing_key, 1);
        assert_eq!(*h.decisions.lock().unwrap(), 0);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn same_book_in_two_genres_is_decided_once() {
        let h = harness(
            &["fantasy", "fiction"],
            &[("fantasy", vec![dragon()]), ("fiction", vec![dragon()])],
            false,
        );
        let mut memory = MemoryStore::new("unused.json");

        let summary = h.monitor.run(&mut memory).await.unwrap();

        assert_eq!(summary.approved, 1);
        assert_eq!(summary.already_seen, 1);
        assert_eq!(memory.get("/works/OL1").unwrap().genre, "fantasy");
    }

    #[tokio::test]
    async fn check_genre_reports_its_own_counters() {
        let guide = Book {
            key: Some("/works/OL2".into()),
            title: Some("Dragon's Fire Study Guide".into()),
            ..dragon()
        };
        let stale = Book {
            key: Some("/works/OL3".into()),
            first_publish_year: Some(YEAR - 3),
            ..dragon()
        };
        let h = harness(
            &["fantasy", "fiction"],
            &[
                ("fantasy", vec![dragon(), guide, stale]),
                ("fiction", vec![dragon()]),
            ],
            false,
        );
        let mut memory = MemoryStore::new("unused.json");

        let fantasy = h.monitor.check_genre("fantasy", &mut memory).await.unwrap();
        assert_eq!(
            fantasy,
            RunSummary {
                genres_checked: 1,
                fetched: 3,
                filtered_out: 1,
                approved: 1,
                rejected: 1,
                ..Default::default()
            }
        );

        let fiction = h.monitor.check_genre("fiction", &mut memory).await.unwrap();
        assert_eq!(fiction.already_seen, 1);
        assert_eq!(fiction.evaluated(), 0);

        let failed = h.monitor.check_genre("horror", &mut memory).await.unwrap();
        assert_eq!(failed.genres_failed, 1);
        assert_eq!(failed.fetched, 0);
    }

    #[tokio::test]
    async fn send_failure_aborts_the_run() {
        let h = harness(
            &["fantasy", "romance"],
            &[("fantasy", vec![dragon()]), ("romance", vec![])],
            true,
        );
        let mut memory = MemoryStore::new("unused.json");

        let err = h.monitor.run(&mut memory).await.unwrap_err();

        assert!(matches!(err, Error::Notify(NotifyError::SendFailed(_))));
        assert_eq!(*h.calls.lock().unwrap(), vec!["fantasy"]);
    }
}
