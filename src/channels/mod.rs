//! Outbound notification channels.

pub mod email;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::catalog::Book;
use crate::error::NotifyError;

pub use email::{EmailConfig, SmtpNotifier};

/// Delivers a notification for an approved book.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name (e.g. "email").
    fn name(&self) -> &str;

    /// Announce `book`, found while polling `genre` at `detected_at`.
    async fn notify(
        &self,
        book: &Book,
        genre: &str,
        detected_at: NaiveDateTime,
    ) -> Result<(), NotifyError>;
}
