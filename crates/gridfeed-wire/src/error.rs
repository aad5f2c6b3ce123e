//! Error types for gridfeed-wire

use thiserror::Error;

/// Result type alias using [`WireError`]
pub type WireResult<T> = std::result::Result<T, WireError>;

/// Errors that can occur while encoding or decoding wire payloads
#[derive(Debug, Error)]
pub enum WireError {
    /// Payload failed to parse as the expected structured format
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Payload parsed but lacks the expected top-level containers
    #[error("Error reading feed: {0}")]
    Retrieval(String),

    /// A row/column key in the feed was not a positive integer
    #[error(transparent)]
    Address(#[from] gridfeed_core::Error),
}
