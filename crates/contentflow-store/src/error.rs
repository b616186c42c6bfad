//! Record store errors.

use thiserror::Error;

/// Errors surfaced by record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure reaching the remote store.
    #[error("Store network error: {0}")]
    Network(String),

    /// The remote store rejected the request.
    #[error("Store API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A response could not be decoded.
    #[error("Store serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
