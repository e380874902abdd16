//! Error types for backend access.

use thiserror::Error;

/// Errors that can occur when talking to the tracking server.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (transport-level: refused, timed out, DNS).
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// JSON deserialization failed.
    #[error("Failed to parse response: {0}")]
    JsonError(String),

    /// The server answered with a status the endpoint does not define.
    #[error("Unexpected HTTP status {0}")]
    UnexpectedStatus(u16),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::JsonError(e.to_string())
        } else {
            BackendError::HttpError(e.to_string())
        }
    }
}
