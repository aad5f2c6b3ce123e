//! Error types for gridfeed-client

use std::fmt;

use thiserror::Error;

use crate::auth::AuthError;
use crate::transport::TransportError;

/// Which resource a by-name lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Spreadsheet,
    Worksheet,
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetKind::Spreadsheet => write!(f, "spreadsheet"),
            SheetKind::Worksheet => write!(f, "worksheet"),
        }
    }
}

/// Errors surfaced by the session layer.
///
/// Construction and addressing problems (`Config`, `Grid`) are synchronous
/// and fail fast; everything network-adjacent comes back through the async
/// operations' `Result`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required construction option is missing or inconsistent
    #[error("Missing or invalid option: {0}")]
    Config(String),

    /// The auth collaborator failed; not retried here
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The transport collaborator failed; not retried here
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A named resource could not be resolved to an id
    #[error("{kind} '{name}' not found")]
    NotFound { kind: SheetKind, name: String },

    /// Grid construction failed (duplicate name, bad address)
    #[error(transparent)]
    Grid(#[from] gridfeed_core::Error),

    /// An inbound payload was malformed or unexpected
    #[error(transparent)]
    Wire(#[from] gridfeed_wire::WireError),

    /// The service answered with a non-success status code
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The batch response carries the service's failure marker; the pending
    /// grid is preserved for retry
    #[error("Error updating spreadsheet: {0}")]
    RemoteBatch(String),

    /// The spreadsheet creation flow did not yield a new resource
    #[error("Failed to create spreadsheet: {0}")]
    CreateFailed(String),
}

/// Result type alias using [`ClientError`]
pub type ClientResult<T> = std::result::Result<T, ClientError>;
