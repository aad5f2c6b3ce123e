//! # gridfeed-client
//!
//! The session layer of the gridfeed spreadsheet client. A [`Session`]
//! authenticates through a [`TokenSource`], resolves human-readable
//! spreadsheet/worksheet names to opaque ids, accumulates cells in a
//! pending grid, and exchanges wire payloads through a [`Transport`].
//!
//! The crate performs no I/O of its own: transports and token sources are
//! collaborator traits the application implements with whatever HTTP and
//! auth stack it already uses.

pub mod auth;
pub mod error;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use auth::{AccessToken, AuthError, Realm, StaticToken, TokenKind, TokenSource};
pub use error::{ClientError, ClientResult, SheetKind};
pub use session::{Session, SessionOptions, WorksheetInfo};
pub use transport::{HttpRequest, HttpResponse, Method, Transport, TransportError};
