//! Error types for the coordination layer.
//!
//! Per-request failures never surface here: the requester folds them into
//! [`RequestResult::Failure`](crate::request::RequestResult). `ConvoyError`
//! covers the plumbing around requests (HTTP client, background tasks).

use thiserror::Error;

/// Result type alias using the convoy error type.
pub type Result<T> = std::result::Result<T, ConvoyError>;

/// Main error type for the coordination layer.
#[derive(Error, Debug)]
pub enum ConvoyError {
    /// HTTP client error
    #[error("HTTP request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The configured endpoint could not be turned into a URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A background coordinator task panicked or was aborted
    #[error("Coordinator task failed: {0}")]
    TaskFailed(String),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<tokio::task::JoinError> for ConvoyError {
    fn from(err: tokio::task::JoinError) -> Self {
        ConvoyError::TaskFailed(err.to_string())
    }
}
