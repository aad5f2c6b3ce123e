//! # gridfeed-core
//!
//! Cell addressing and reference resolution for the gridfeed client.
//!
//! This crate is the synchronous, I/O-free heart of the library:
//! - [`Address`] - 1-based (row, column) pairs and the `R{row}C{col}` token
//! - [`BatchInput`] - the tagged model of shape-polymorphic caller input
//! - [`CellGrid`] - the sparse pending-cell collection and name index
//! - [`resolve_references`] - `{{ name }}` / `{{ dr, dc }}` substitution
//!
//! ## Example
//!
//! ```rust
//! use gridfeed_core::{BatchInput, CellGrid, CellValue};
//!
//! let mut grid = CellGrid::new();
//!
//! // Array form: places "a" at R1C1, "b" at R1C2.
//! grid.add(vec![vec![CellValue::from("a"), CellValue::from("b")]]).unwrap();
//!
//! // Object form with explicit row/column keys.
//! let input = BatchInput::from_json(serde_json::json!({ "3": { "2": "c" } })).unwrap();
//! grid.add(input).unwrap();
//!
//! assert_eq!(grid.len(), 3);
//! ```

pub mod address;
pub mod error;
pub mod grid;
pub mod input;
pub mod resolver;
pub mod value;

// Re-exports for convenience
pub use address::{parse_index, wire_token, Address};
pub use error::{Error, Result};
pub use grid::{CellEntry, CellGrid};
pub use input::{BatchInput, CellInput, ColumnInput, EntrySpec, RowInput, SparseRow};
pub use resolver::resolve_references;
pub use value::CellValue;
