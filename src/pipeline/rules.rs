//! Inclusion filters applied to every fetched book.
//!
//! The chain short-circuits on the first failing check:
//! - English language tag present
//! - ASCII-only title (drops non-Latin-script titles)
//! - no denylisted fragments in the title (serialized web fiction)
//! - published within the freshness window
//! - enough editions to suggest some traction
//!
//! Only books that pass every check reach the decision strategy.

use std::fmt;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::catalog::Book;
use crate::config::FilterConfig;

/// Why a book was filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRejection {
    MissingLanguage,
    NotEnglish,
    NonAsciiTitle,
    DenylistedTitle { fragment: String },
    TooOld { year: Option<i32>, earliest: i32 },
    TooFewEditions { count: u32, min: u32 },
}

impl FilterRejection {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingLanguage => "missing_language",
            Self::NotEnglish => "not_english",
            Self::NonAsciiTitle => "non_ascii_title",
            Self::DenylistedTitle { .. } => "denylisted_title",
            Self::TooOld { .. } => "too_old",
            Self::TooFewEditions { .. } => "too_few_editions",
        }
    }
}

impl fmt::Display for FilterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLanguage => write!(f, "no language metadata"),
            Self::NotEnglish => write!(f, "no English language tag"),
            Self::NonAsciiTitle => write!(f, "title is not ASCII"),
            Self::DenylistedTitle { fragment } => write!(f, "title contains {fragment:?}"),
            Self::TooOld { year: Some(y), earliest } => {
                write!(f, "published {y}, earliest accepted {earliest}")
            }
            Self::TooOld { year: None, .. } => write!(f, "no publish year"),
            Self::TooFewEditions { count, min } => write!(f, "{count} editions, need {min}"),
        }
    }
}

/// Ordered set of inclusion checks.
pub struct FilterChain {
    language: String,
    denylist: Option<Regex>,
    earliest_year: i32,
    min_editions: u32,
}

impl FilterChain {
    /// Build a chain for a run happening in `current_year`.
    pub fn new(config: &FilterConfig, current_year: i32) -> Result<Self, regex::Error> {
        let denylist = if config.title_denylist.is_empty() {
            None
        } else {
            let alternation = config
                .title_denylist
                .iter()
                .map(|s| regex::escape(s))
                .collect::<Vec<_>>()
                .join("|");
            Some(RegexBuilder::new(&alternation).case_insensitive(true).build()?)
        };

        Ok(Self {
            language: config.language.clone(),
            denylist,
            earliest_year: i32::try_from(config.freshness_years)
                .map_or(i32::MIN, |years| current_year.saturating_sub(years)),
            min_editions: config.min_editions,
        })
    }

    /// Oldest `first_publish_year` still accepted.
    pub fn earliest_year(&self) -> i32 {
        self.earliest_year
    }

    /// Run every check in order. `Ok(())` means the book passes.
    pub fn evaluate(&self, book: &Book) -> Result<(), FilterRejection> {
        let languages = book
            .language
            .as_ref()
            .ok_or(FilterRejection::MissingLanguage)?;
        if !languages.iter().any(|l| l == &self.language) {
            return Err(FilterRejection::NotEnglish);
        }

        let title = book.title();
        if !title.is_ascii() {
            return Err(FilterRejection::NonAsciiTitle);
        }

        if let Some(ref denylist) = self.denylist
            && let Some(m) = denylist.find(title)
        {
            return Err(FilterRejection::DenylistedTitle {
                fragment: m.as_str().to_lowercase(),
            });
        }

        match book.first_publish_year {
            Some(year) if year >= self.earliest_year => {}
            year => {
                return Err(FilterRejection::TooOld {
                    year,
                    earliest: self.earliest_year,
                });
            }
        }

        let count = book.edition_count.unwrap_or(0);
        if count < self.min_editions {
            return Err(FilterRejection::TooFewEditions {
                count,
                min: self.min_editions,
            });
        }

        Ok(())
    }

    /// Convenience wrapper that logs the rejection reason.
    pub fn passes(&self, book: &Book) -> bool {
        match self.evaluate(book) {
            Ok(()) => true,
            Err(rejection) => {
                debug!(
                    key = book.key.as_deref().unwrap_or("-"),
                    title = %book.title(),
                    reason = rejection.label(),
                    "Filtered out: {rejection}"
                );
                false
            }
        }
    }
}
