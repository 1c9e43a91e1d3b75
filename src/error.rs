//! Error types for the book monitor.

use std::path::PathBuf;

/// Top-level error type for a monitor run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Catalog fetch errors. The pipeline logs these and skips the genre.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Catalog returned status {status} for {genre}")]
    Status { genre: String, status: u16 },

    #[error("Request for {genre} failed: {reason}")]
    Http { genre: String, reason: String },

    #[error("Could not decode catalog response for {genre}: {reason}")]
    Decode { genre: String, reason: String },
}

/// Notification delivery errors. These abort the run.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP relay error: {0}")]
    Relay(String),

    #[error("SMTP send failed: {0}")]
    SendFailed(String),
}

/// State file errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the monitor.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn load_config(missing: &str) -> Result<()> {
        Err(ConfigError::MissingEnvVar(missing.into()))?
    }

    fn build_client() -> Result<()> {
        Err(FetchError::Client("no TLS backend".into()))?
    }

    fn persist() -> Result<()> {
        Err(StoreError::Write {
            path: PathBuf::from("/readonly/data.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })?
    }

    #[test]
    fn question_mark_wraps_config_errors() {
        let err = load_config("EMAIL_ADDRESS").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingEnvVar(_))));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required environment variable: EMAIL_ADDRESS"
        );
    }

    #[test]
    fn question_mark_wraps_fetch_errors() {
        let err = build_client().unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Client(_))));
    }

    #[test]
    fn question_mark_wraps_store_errors() {
        let err = persist().unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::Write { .. })));
        assert!(err.to_string().contains("/readonly/data.json"));
    }
}
