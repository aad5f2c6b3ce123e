//! The pending cell grid
//!
//! A [`CellGrid`] accumulates cells between sends: a sparse map from
//! [`Address`] to [`CellEntry`] plus an index of symbolic names. It is the
//! lookup source for reference resolution and is cleared after a successful
//! transmission.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::input::{BatchInput, CellInput, ColumnInput, EntrySpec, RowInput, SparseRow};
use crate::value::CellValue;
use crate::Address;

/// A cell pending transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEntry {
    pub address: Address,
    /// Literal content; `None` entries are skipped at serialization.
    pub value: Option<CellValue>,
    /// Symbolic label, unique across the grid.
    pub name: Option<String>,
    /// Entry intentionally carries no value yet.
    pub ref_only: bool,
    /// Opaque passthrough fields from entry-shaped input.
    pub extra: Map<String, Value>,
}

/// Sparse collection of pending cells plus the name index.
///
/// Rows and columns need not be contiguous. Iteration is in ascending
/// (row, column) order, so serialization output is deterministic.
#[derive(Debug, Default)]
pub struct CellGrid {
    entries: BTreeMap<Address, CellEntry>,
    names: HashMap<String, Address>,
}

impl CellGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a batch of input on the grid.
    ///
    /// Array form starts at offsets (0, 0); object form keys are absolute
    /// row/column numbers. Inserting at an occupied address overwrites with
    /// a warning; reusing a symbolic name is a fatal error and aborts the
    /// rest of the batch.
    pub fn add(&mut self, input: impl Into<BatchInput>) -> Result<()> {
        match input.into() {
            BatchInput::Rows(rows) => self.place_rows(rows, 0, 0),
            BatchInput::Sparse(sparse) => {
                for (row, value) in sparse {
                    let row_base = anchor(row, "row")?;
                    match value {
                        // A sequence under a row key anchors at that row,
                        // column offsets do not apply.
                        SparseRow::Rows(rows) => self.place_rows(rows, row_base, 0)?,
                        SparseRow::Columns(cols) => {
                            for (col, cell) in cols {
                                match cell {
                                    ColumnInput::Block(rows) => {
                                        self.place_rows(rows, row_base, anchor(col, "column")?)?
                                    }
                                    ColumnInput::Cell(cell) => self.place_cell(cell, row, col)?,
                                }
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn place_rows(&mut self, rows: Vec<RowInput>, row_offset: u32, col_offset: u32) -> Result<()> {
        for (i, row) in rows.into_iter().enumerate() {
            let r = i as u32 + 1 + row_offset;
            match row {
                RowInput::Cell(cell) => self.place_cell(cell, r, 1 + col_offset)?,
                RowInput::Cells(cells) => {
                    for (j, cell) in cells.into_iter().enumerate() {
                        self.place_cell(cell, r, j as u32 + 1 + col_offset)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn place_cell(&mut self, cell: CellInput, row: u32, col: u32) -> Result<()> {
        let address = Address::new(row, col)?;
        let entry = match cell {
            CellInput::Value(value) => CellEntry {
                address,
                value: Some(value),
                name: None,
                ref_only: false,
                extra: Map::new(),
            },
            CellInput::Entry(EntrySpec {
                value,
                name,
                ref_only,
                extra,
            }) => CellEntry {
                address,
                value,
                name,
                ref_only,
                extra,
            },
        };

        if let Some(name) = &entry.name {
            match self.names.entry(name.clone()) {
                std::collections::hash_map::Entry::Occupied(_) => {
                    return Err(Error::DuplicateName(name.clone()));
                }
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(address);
                }
            }
        }

        if entry.value.is_none() && !entry.ref_only {
            log::warn!("missing value in entry at {address}");
        }

        match self.entries.entry(address) {
            Entry::Occupied(mut slot) => {
                log::warn!("{address} already exists, overwriting");
                slot.insert(entry);
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
        Ok(())
    }

    /// Clear all pending entries and the name index.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.names.clear();
    }

    /// Pending entries in ascending (row, column) order.
    pub fn entries(&self) -> impl Iterator<Item = &CellEntry> {
        self.entries.values()
    }

    pub fn get(&self, address: Address) -> Option<&CellEntry> {
        self.entries.get(&address)
    }

    /// The name index consumed by the reference resolver.
    pub fn names(&self) -> &HashMap<String, Address> {
        &self.names
    }

    pub fn lookup_name(&self, name: &str) -> Option<Address> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Convert a 1-based sparse key into a placement offset.
fn anchor(index: u32, axis: &str) -> Result<u32> {
    index
        .checked_sub(1)
        .ok_or_else(|| Error::InvalidAddress(format!("{axis} must be >= 1, got {index}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn addr(row: u32, col: u32) -> Address {
        Address::new(row, col).unwrap()
    }

    fn value_at(grid: &CellGrid, row: u32, col: u32) -> &CellValue {
        grid.get(addr(row, col))
            .unwrap_or_else(|| panic!("no entry at R{row}C{col}"))
            .value
            .as_ref()
            .expect("entry has no value")
    }

    #[test]
    fn test_array_form_placement() {
        let mut grid = CellGrid::new();
        grid.add(vec![
            vec![CellValue::from("a"), CellValue::from("b")],
            vec![CellValue::from("c")],
        ])
        .unwrap();

        assert_eq!(value_at(&grid, 1, 1), &CellValue::from("a"));
        assert_eq!(value_at(&grid, 1, 2), &CellValue::from("b"));
        assert_eq!(value_at(&grid, 2, 1), &CellValue::from("c"));
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_scalar_row_is_single_column() {
        let mut grid = CellGrid::new();
        grid.add(vec![CellValue::from("only")]).unwrap();
        assert_eq!(value_at(&grid, 1, 1), &CellValue::from("only"));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_object_form_absolute_placement() {
        let mut grid = CellGrid::new();
        grid.add(BatchInput::from_json(json!({ "5": { "3": "x" } })).unwrap())
            .unwrap();
        assert_eq!(value_at(&grid, 5, 3), &CellValue::from("x"));
    }

    #[test]
    fn test_object_form_row_sequence() {
        // { "4": [["a", "b"]] } anchors the sequence at row 4.
        let mut grid = CellGrid::new();
        grid.add(BatchInput::from_json(json!({ "4": [["a", "b"]] })).unwrap())
            .unwrap();
        assert_eq!(value_at(&grid, 4, 1), &CellValue::from("a"));
        assert_eq!(value_at(&grid, 4, 2), &CellValue::from("b"));
    }

    #[test]
    fn test_object_form_nested_block() {
        // A block under { row: { col: [...] } } anchors at (row, col).
        let mut grid = CellGrid::new();
        grid.add(BatchInput::from_json(json!({ "2": { "3": [["a", "b"], ["c"]] } })).unwrap())
            .unwrap();
        assert_eq!(value_at(&grid, 2, 3), &CellValue::from("a"));
        assert_eq!(value_at(&grid, 2, 4), &CellValue::from("b"));
        assert_eq!(value_at(&grid, 3, 3), &CellValue::from("c"));
    }

    #[test]
    fn test_zero_sparse_keys_rejected() {
        let mut grid = CellGrid::new();

        let err = grid
            .add(BatchInput::Sparse(vec![(
                0,
                SparseRow::Rows(vec![RowInput::Cell(CellInput::Value(CellValue::from("x")))]),
            )]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));

        let err = grid
            .add(BatchInput::Sparse(vec![(
                2,
                SparseRow::Columns(vec![(
                    0,
                    ColumnInput::Block(vec![RowInput::Cell(CellInput::Value(CellValue::from(
                        "y",
                    )))]),
                )]),
            )]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));

        assert!(grid.is_empty());
    }

    #[test]
    fn test_duplicate_address_overwrites() {
        let mut grid = CellGrid::new();
        grid.add(vec![CellValue::from("first")]).unwrap();
        grid.add(vec![CellValue::from("second")]).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(value_at(&grid, 1, 1), &CellValue::from("second"));
    }

    #[test]
    fn test_duplicate_name_is_fatal() {
        let mut grid = CellGrid::new();
        grid.add(BatchInput::Rows(vec![RowInput::Cell(CellInput::Entry(
            EntrySpec::named("total", 1),
        ))]))
        .unwrap();

        let err = grid
            .add(BatchInput::Sparse(vec![(
                9,
                SparseRow::Columns(vec![(
                    9,
                    ColumnInput::Cell(CellInput::Entry(EntrySpec::named("total", 2))),
                )]),
            )]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(name) if name == "total"));
    }

    #[test]
    fn test_name_registered_at_insertion() {
        let mut grid = CellGrid::new();
        grid.add(BatchInput::from_json(json!({ "2": { "4": { "val": 7, "name": "rate" } } })).unwrap())
            .unwrap();
        assert_eq!(grid.lookup_name("rate"), Some(addr(2, 4)));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut grid = CellGrid::new();
        grid.add(vec![CellValue::from(1)]).unwrap();
        grid.reset();
        assert!(grid.is_empty());
        assert!(grid.names().is_empty());
        grid.reset();
        assert!(grid.is_empty());
    }

    #[test]
    fn test_ref_only_entry_has_no_value() {
        let mut grid = CellGrid::new();
        grid.add(BatchInput::from_json(json!({ "1": { "1": { "ref": true, "name": "here" } } })).unwrap())
            .unwrap();
        let entry = grid.get(addr(1, 1)).unwrap();
        assert!(entry.ref_only);
        assert!(entry.value.is_none());
    }
}
