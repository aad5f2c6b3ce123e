//! Error types for gridfeed-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while addressing cells or building a grid
#[derive(Debug, Error)]
pub enum Error {
    /// A row or column index was not a positive integer
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Batch input had a shape that cannot be placed on a grid
    #[error("Invalid batch input: {0}")]
    InvalidInput(String),

    /// Two cells were registered under the same symbolic name
    #[error("Name already exists: {0}")]
    DuplicateName(String),
}
