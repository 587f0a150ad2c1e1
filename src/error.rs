//! Error types for the CRPT client.

use std::time::Duration;
use thiserror::Error;

/// Main error type for CRPT client operations.
#[derive(Error, Debug)]
pub enum CrptError {
    /// Rejected limiter or client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The caller was interrupted while waiting for a permit
    #[error("Interrupted while waiting for a rate limit permit")]
    Interrupted,

    /// No permit became available within the configured maximum wait
    #[error("No rate limit permit available after waiting {0:?}")]
    WaitTimeout(Duration),

    /// The request was rejected locally before reaching the limiter
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The API answered with a status other than 200 or 201
    #[error("API error: {status} - {body}")]
    RemoteCallFailed { status: u16, body: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CRPT client operations.
pub type Result<T> = std::result::Result<T, CrptError>;
