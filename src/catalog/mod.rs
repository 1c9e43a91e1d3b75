//! Book catalog access — the record shape and the fetcher seam.

pub mod open_library;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FetchError;

pub use open_library::OpenLibraryClient;

/// A book as returned by the catalog search endpoint.
///
/// Every field is optional upstream; list fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Catalog identifier, e.g. `/works/OL123W`.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Vec<String>,
    #[serde(default)]
    pub first_publish_year: Option<i32>,
    #[serde(default)]
    pub edition_count: Option<u32>,
    /// Language tags (`eng`, `fre`, ...). `None` when the catalog has no
    /// language metadata at all.
    #[serde(default)]
    pub language: Option<Vec<String>>,
}

impl Book {
    /// Title, or the empty string when missing.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Authors joined for display.
    pub fn authors_display(&self) -> String {
        if self.author_name.is_empty() {
            "Unknown".to_string()
        } else {
            self.author_name.join(", ")
        }
    }
}

/// Body of `GET /search.json`.
///
/// Docs are kept raw so one malformed entry only drops itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub docs: Vec<serde_json::Value>,
}

impl SearchResponse {
    /// Decode every doc, returning the books and how many were skipped.
    pub fn into_books(self) -> (Vec<Book>, usize) {
        let mut skipped = 0;
        let books = self
            .docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<Book>(doc) {
                Ok(book) => Some(book),
                Err(e) => {
                    debug!("Skipping malformed catalog doc: {e}");
                    skipped += 1;
                    None
                }
            })
            .collect();
        (books, skipped)
    }
}

/// Source of newly published books, one genre at a time.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch the newest books for `genre`.
    async fn fetch_recent(&self, genre: &str) -> Result<Vec<Book>, FetchError>;
}
