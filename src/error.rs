//! Error types for the console client

use thiserror::Error;

/// Client error
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
}

impl ClientError {
    /// Whether this error is an authorization gate (401/403).
    ///
    /// Collection loads treat these as "not permitted yet" rather than
    /// faults, so they are never surfaced to the error reporter.
    pub fn is_auth_denied(&self) -> bool {
        match self {
            ClientError::Server { status, .. } => *status == 401 || *status == 403,
            ClientError::Http(err) => err
                .status()
                .is_some_and(|s| s.as_u16() == 401 || s.as_u16() == 403),
            _ => false,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
