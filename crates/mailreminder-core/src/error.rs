//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a reminder cycle.
#[derive(Debug, Error)]
pub enum Error {
    /// The event table could not be loaded or saved.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Event table persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The events file does not exist.
    #[error("events file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading or writing the events file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Required columns are absent from the header row.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set to an unusable value.
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The JSON configuration file could not be read.
    #[error("cannot read config file {}: {source}", .path.display())]
    File {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The JSON configuration file is malformed.
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    /// The bounce phrase does not compile into a pattern.
    #[error("invalid bounce phrase: {0}")]
    Pattern(#[from] regex::Error),
}

/// Per-event validation failures. Recorded on the event, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EventError {
    /// The date cell is missing or unparseable.
    #[error("Invalid event date")]
    InvalidDate,

    /// The recipient does not look like an email address.
    #[error("Invalid email format")]
    InvalidAddress,
}

/// Why a single reminder could not be handed to the mail server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendFailure {
    /// The server could not be reached or the connection broke.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server refused the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server rejected this message.
    #[error("{0}")]
    Rejected(String),

    /// An address was refused before contacting the server.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Mailbox access errors. These abort bounce reconciliation only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// The server could not be reached or the connection broke.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server refused the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A mailbox command failed.
    #[error("Operation failed: {0}")]
    Operation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_error_text() {
        assert_eq!(EventError::InvalidDate.to_string(), "Invalid event date");
        assert_eq!(EventError::InvalidAddress.to_string(), "Invalid email format");
    }

    #[test]
    fn test_store_error_text() {
        let err = StoreError::MissingColumns(vec!["status".into(), "error".into()]);
        assert_eq!(err.to_string(), "missing required columns: status, error");

        let err = Error::from(StoreError::NotFound(PathBuf::from("events.csv")));
        assert_eq!(err.to_string(), "Store error: events file not found: events.csv");
    }

    #[test]
    fn test_send_failure_keeps_server_text() {
        let failure = SendFailure::Rejected("SMTP error 552: mailbox full".into());
        assert_eq!(failure.to_string(), "SMTP error 552: mailbox full");
    }
}
