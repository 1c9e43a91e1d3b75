//! Configuration types.
//!
//! Everything the pipeline reads lives in [`MonitorConfig`], built once at
//! startup and passed in. Mail settings live next to the notifier in
//! [`crate::channels::email::EmailConfig`].

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Genres polled when `BOOK_MONITOR_GENRES` is not set.
pub const DEFAULT_GENRES: &[&str] = &["fantasy", "romance", "fiction", "thriller", "mystery"];

/// Title fragments that mark serialized web fiction.
pub const DEFAULT_TITLE_DENYLIST: &[&str] = &["chapter", "episodes"];

/// Title keywords the default decision strategy rejects.
pub const DEFAULT_REJECT_TERMS: &[&str] = &["guide", "summary"];

/// Catalog endpoint settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// API base URL; also the prefix for links in notifications.
    pub base_url: String,
    /// `limit` query parameter per genre.
    pub result_limit: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openlibrary.org".to_string(),
            result_limit: 40,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Thresholds for the inclusion filters.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Language tag a book must carry.
    pub language: String,
    /// Minimum `edition_count`.
    pub min_editions: u32,
    /// How many years back still count as new. 0 = current year only.
    pub freshness_years: u32,
    /// Case-insensitive title fragments that exclude a book.
    pub title_denylist: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            min_editions: 3,
            freshness_years: 1,
            title_denylist: to_owned_list(DEFAULT_TITLE_DENYLIST),
        }
    }
}

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Subjects to poll, in order.
    pub genres: Vec<String>,
    /// Path of the JSON state file.
    pub data_file: PathBuf,
    pub catalog: CatalogConfig,
    pub filters: FilterConfig,
    /// Keywords for the default decision strategy.
    pub reject_terms: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            genres: to_owned_list(DEFAULT_GENRES),
            data_file: PathBuf::from("data.json"),
            catalog: CatalogConfig::default(),
            filters: FilterConfig::default(),
            reject_terms: to_owned_list(DEFAULT_REJECT_TERMS),
        }
    }
}

impl MonitorConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Unset keys keep their
    /// defaults; unparsable numbers fall back to the default as well.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let genres = match lookup("BOOK_MONITOR_GENRES") {
            Some(raw) => {
                let genres = split_list(&raw);
                if genres.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: "BOOK_MONITOR_GENRES".into(),
                        message: "at least one genre is required".into(),
                    });
                }
                genres
            }
            None => defaults.genres,
        };

        let data_file = lookup("BOOK_MONITOR_DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_file);

        let catalog = CatalogConfig {
            base_url: lookup("BOOK_MONITOR_CATALOG_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.catalog.base_url),
            result_limit: parse_or(
                &lookup,
                "BOOK_MONITOR_RESULT_LIMIT",
                defaults.catalog.result_limit,
            ),
            timeout: lookup("BOOK_MONITOR_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.catalog.timeout),
        };

        let filters = FilterConfig {
            language: defaults.filters.language,
            min_editions: parse_or(
                &lookup,
                "BOOK_MONITOR_MIN_EDITIONS",
                defaults.filters.min_editions,
            ),
            freshness_years: parse_or(
                &lookup,
                "BOOK_MONITOR_FRESHNESS_YEARS",
                defaults.filters.freshness_years,
            ),
            title_denylist: lookup("BOOK_MONITOR_DENYLIST")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.filters.title_denylist),
        };

        let reject_terms = lookup("BOOK_MONITOR_REJECT_TERMS")
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.reject_terms);

        Ok(Self {
            genres,
            data_file,
            catalog,
            filters,
            reject_terms,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

/// Split a comma-separated value, dropping blanks and lower-casing entries.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
