//! Email notifications over an authenticated SMTP relay via lettre.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::catalog::Book;
use crate::channels::Notifier;
use crate::error::{ConfigError, NotifyError};

// ── Configuration ───────────────────────────────────────────────────

/// SMTP settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Sender address, also the SMTP username.
    pub address: String,
    pub password: SecretString,
    pub recipient: String,
}

impl EmailConfig {
    /// Build config from environment variables.
    ///
    /// `EMAIL_ADDRESS`, `EMAIL_PASSWORD` and `RECIPIENT_EMAIL` are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let address = required("EMAIL_ADDRESS")?;
        let password = SecretString::from(required("EMAIL_PASSWORD")?);
        let recipient = required("RECIPIENT_EMAIL")?;

        let smtp_host = lookup("EMAIL_SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string());
        let smtp_port: u16 = lookup("EMAIL_SMTP_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(465);

        Ok(Self {
            smtp_host,
            smtp_port,
            address,
            password,
            recipient,
        })
    }
}

// ── Message formatting ──────────────────────────────────────────────

/// Subject and plaintext body for one approved book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Format the notification for `book`.
///
/// `site_url` prefixes the book key to form the catalog link.
pub fn compose(book: &Book, genre: &str, site_url: &str, detected_at: NaiveDateTime) -> Notification {
    let subject = format!("New {} Book Added!", capitalize(genre));
    let published = book
        .first_publish_year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let link = format!(
        "{}{}",
        site_url.trim_end_matches('/'),
        book.key.as_deref().unwrap_or("")
    );

    let body = format!(
        "Title: {}\nAuthor: {}\nFirst Published: {}\nLink: {}\nDetected At: {}\n",
        book.title(),
        book.authors_display(),
        published,
        link,
        detected_at.format("%Y-%m-%d %H:%M:%S"),
    );

    Notification { subject, body }
}

/// Upper-case the first character, lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

// ── Notifier ────────────────────────────────────────────────────────

/// Sends one plaintext email per approved book.
pub struct SmtpNotifier {
    config: EmailConfig,
    site_url: String,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig, site_url: impl Into<String>) -> Self {
        Self {
            config,
            site_url: site_url.into(),
        }
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        Message::builder()
            .from(parse_mailbox(&self.config.address)?)
            .to(parse_mailbox(&self.config.recipient)?)
            .subject(notification.subject.as_str())
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    /// Blocking send over implicit TLS — run in spawn_blocking.
    fn send_blocking(config: &EmailConfig, email: &Message) -> Result<(), NotifyError> {
        let creds = Credentials::new(
            config.address.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::relay(&config.smtp_host)
            .map_err(|e| NotifyError::Relay(e.to_string()))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        transport
            .send(email)
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn notify(
        &self,
        book: &Book,
        genre: &str,
        detected_at: NaiveDateTime,
    ) -> Result<(), NotifyError> {
        let notification = compose(book, genre, &self.site_url, detected_at);
        let email = self.build_message(&notification)?;

        let config = self.config.clone();
        tokio::task::spawn_blocking(move || Self::send_blocking(&config, &email))
            .await
            .map_err(|e| NotifyError::SendFailed(format!("send task failed: {e}")))??;

        info!(to = %self.config.recipient, subject = %notification.subject, "Email sent");
        Ok(())
    }
}
