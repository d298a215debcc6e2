//! Error types for the remind backend.

use thiserror::Error;

/// Result type alias using remind's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for remind operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Reminder not found (or not owned by the caller)
    #[error("Reminder not found: {0}")]
    ReminderNotFound(uuid::Uuid),

    /// AI inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Places lookup failed
    #[error("Places error: {0}")]
    Places(String),

    /// Speech synthesis failed
    #[error("Speech error: {0}")]
    Speech(String),

    /// Enrichment queue / background job error
    #[error("Job error: {0}")]
    Job(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (missing/invalid capability credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
