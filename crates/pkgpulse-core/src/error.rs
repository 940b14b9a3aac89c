//! Error type for remote lookups.
//!
//! These errors never cross the analysis boundary: the client wrappers
//! absorb them into "unknown" results (see `registry` and `advisories`).

use thiserror::Error;

/// Error raised by a registry or advisory request.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected status {status} for '{name}'")]
    Status { status: u16, name: String },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}
