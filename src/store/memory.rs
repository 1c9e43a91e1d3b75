//! File-backed memory of evaluated books.
//!
//! The state file is a JSON object keyed by catalog identifier:
//!
//! ```json
//! {
//!   "/works/OL1W": {
//!     "title": "Dragon's Fire",
//!     "genre": "fantasy",
//!     "ai_decision": "YES",
//!     "notified": true,
//!     "evaluated_at": "2026-03-01T09:30:00.123456"
//!   }
//! }
//! ```
//!
//! A flat JSON array of identifiers (the older format) is also accepted;
//! those entries carry no record and are written back as `null`. Entries
//! whose value is not a readable record still count as seen and are written
//! back unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::pipeline::types::EvaluationRecord;

#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedState {
    Records(BTreeMap<String, serde_json::Value>),
    SeenIds(Vec<String>),
}

/// One remembered identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
enum StoredEntry {
    Evaluated(EvaluationRecord),
    /// Seen, but without a readable record. Saved back verbatim.
    Opaque(serde_json::Value),
}

impl StoredEntry {
    fn from_value(key: &str, value: serde_json::Value) -> Self {
        if value.is_null() {
            return Self::Opaque(value);
        }
        match serde_json::from_value::<EvaluationRecord>(value.clone()) {
            Ok(record) => Self::Evaluated(record),
            Err(e) => {
                warn!(key = %key, "Unreadable record kept as seen: {e}");
                Self::Opaque(value)
            }
        }
    }

    fn record(&self) -> Option<&EvaluationRecord> {
        match self {
            Self::Evaluated(record) => Some(record),
            Self::Opaque(_) => None,
        }
    }
}

/// Insert-only map of book identifier → evaluation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    path: PathBuf,
    entries: BTreeMap<String, StoredEntry>,
}

impl MemoryStore {
    /// An empty store that will save to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load state from `path`.
    ///
    /// Never fails: a missing or blank file yields an empty store, and an
    /// unreadable or corrupt one is logged and reset.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No state file yet, starting empty");
                return Self::new(path);
            }
            Err(e) => {
                warn!(path = %path.display(), "Unreadable state file, resetting: {e}");
                return Self::new(path);
            }
        };

        match Self::parse(&content) {
            Ok(entries) => {
                debug!(path = %path.display(), entries = entries.len(), "Loaded state file");
                Self { path, entries }
            }
            Err(e) => {
                warn!(path = %path.display(), "Corrupted state file detected, resetting: {e}");
                Self::new(path)
            }
        }
    }

    fn parse(content: &str) -> Result<BTreeMap<String, StoredEntry>, serde_json::Error> {
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(match serde_json::from_str::<PersistedState>(content)? {
            PersistedState::Records(entries) => entries
                .into_iter()
                .map(|(key, value)| {
                    let entry = StoredEntry::from_value(&key, value);
                    (key, entry)
                })
                .collect(),
            PersistedState::SeenIds(ids) => ids
                .into_iter()
                .map(|id| (id, StoredEntry::Opaque(serde_json::Value::Null)))
                .collect(),
        })
    }

    /// Path this store saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Has this identifier been evaluated before?
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Evaluation for `id`, if one was recorded with metadata.
    pub fn get(&self, id: &str) -> Option<&EvaluationRecord> {
        self.entries.get(id).and_then(StoredEntry::record)
    }

    /// Record an evaluation. Existing entries are never overwritten;
    /// returns `false` when `id` was already present.
    pub fn record(&mut self, id: impl Into<String>, evaluation: EvaluationRecord) -> bool {
        use std::collections::btree_map::Entry;

        match self.entries.entry(id.into()) {
            Entry::Vacant(slot) => {
                slot.insert(StoredEntry::Evaluated(evaluation));
                true
            }
            Entry::Occupied(slot) => {
                debug!(key = %slot.key(), "Already recorded, keeping original entry");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite the state file with the full mapping.
    pub async fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.entries)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        fs::write(&self.path, json)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "Saved state file");
        Ok(())
    }
}
