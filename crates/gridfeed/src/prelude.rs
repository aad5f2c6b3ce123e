//! Convenience re-exports for typical usage.
//!
//! ```rust
//! use gridfeed::prelude::*;
//! ```

pub use gridfeed_client::{
    AccessToken, ClientError, ClientResult, Realm, Session, SessionOptions, StaticToken,
    TokenSource, Transport, WorksheetInfo,
};
pub use gridfeed_core::{Address, BatchInput, CellGrid, CellValue, EntrySpec};
pub use gridfeed_wire::{RetrievedCell, RowMap};
