//! Open Library search client.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::catalog::{Book, Catalog, SearchResponse};
use crate::config::CatalogConfig;
use crate::error::FetchError;

/// Fetches recent books from `{base_url}/search.json`.
pub struct OpenLibraryClient {
    client: reqwest::Client,
    base_url: String,
    result_limit: u32,
}

impl OpenLibraryClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("book-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            result_limit: config.result_limit,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search.json", self.base_url)
    }
}

#[async_trait]
impl Catalog for OpenLibraryClient {
    async fn fetch_recent(&self, genre: &str) -> Result<Vec<Book>, FetchError> {
        let limit = self.result_limit.to_string();
        let resp = self
            .client
            .get(self.search_url())
            .query(&[("subject", genre), ("sort", "new"), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Http {
                genre: genre.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                genre: genre.to_string(),
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = resp.json().await.map_err(|e| FetchError::Decode {
            genre: genre.to_string(),
            reason: e.to_string(),
        })?;

        let (books, skipped) = body.into_books();
        if skipped > 0 {
            warn!(genre = %genre, skipped, "Dropped malformed catalog docs");
        }
        debug!(genre = %genre, count = books.len(), "Fetched catalog page");
        Ok(books)
    }
}
