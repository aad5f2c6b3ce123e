//! # gridfeed
//!
//! A client for remote tabular data services speaking Google-Spreadsheets-
//! style cell feeds: authenticated HTTP, XML batch upload, JSON feed
//! download.
//!
//! Cells are described with high-level addressing (nested sequences, sparse
//! row/column maps, named cells), queued on a pending grid, and sent as one
//! batch. Text values may reference other cells symbolically
//! (`{{ name }}`) or relatively (`{{ dr, dc }}`); references resolve to
//! `R{row}C{col}` tokens when the batch is serialized.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gridfeed::prelude::*;
//!
//! # async fn run(transport: impl Transport) -> Result<(), ClientError> {
//! let options = SessionOptions {
//!     spreadsheet_name: Some("Budget".into()),
//!     worksheet_name: Some("Sheet 1".into()),
//!     ..Default::default()
//! };
//! let tokens = StaticToken(AccessToken::bearer("ya29..."));
//! let mut session = Session::connect(options, &tokens, transport).await?;
//!
//! session.add(vec![vec![CellValue::from("subtotal"), CellValue::from(100)]])?;
//! session.add_json(serde_json::json!({
//!     "2": { "2": { "val": "={{ 0, -1 }}*2", "name": "doubled" } }
//! }))?;
//! session.send().await?;
//!
//! let (rows, info) = session.receive().await?;
//! println!("{} cells in {} rows", info.total_cells, info.total_rows);
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

pub mod prelude;

// Core: addressing, grid, references
pub use gridfeed_core::{
    parse_index, resolve_references, wire_token, Address, BatchInput, CellEntry, CellGrid,
    CellInput, CellValue, ColumnInput, EntrySpec, Error, RowInput, SparseRow,
};

// Wire: batch envelope and feed parsing
pub use gridfeed_wire::{
    batch_failed, compile_grid, find_feed_entry_id, parse_cell_feed, Author, BatchEnvelope,
    FeedSnapshot, RetrievedCell, RowMap, WireError,
};

// Client: session and collaborator seams
pub use gridfeed_client::{
    AccessToken, AuthError, ClientError, ClientResult, HttpRequest, HttpResponse, Method, Realm,
    Session, SessionOptions, SheetKind, StaticToken, TokenKind, TokenSource, Transport,
    TransportError, WorksheetInfo,
};
