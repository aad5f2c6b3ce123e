//! # gridfeed-wire
//!
//! Wire codec for the gridfeed client: renders the outbound XML batch
//! envelope from a [`CellGrid`](gridfeed_core::CellGrid) and parses the
//! service's inbound JSON feeds (cell feeds and resource list feeds).
//!
//! Nothing here performs I/O; the client crate hands bodies in and out.

pub mod batch;
pub mod error;
pub mod feed;

// Re-exports for convenience
pub use batch::{batch_failed, compile_grid, BatchEnvelope};
pub use error::{WireError, WireResult};
pub use feed::{find_feed_entry_id, parse_cell_feed, Author, FeedSnapshot, RetrievedCell, RowMap};
