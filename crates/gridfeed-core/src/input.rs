//! Shape-polymorphic batch input
//!
//! Callers describe a batch of cells as a flat value, a (possibly nested)
//! sequence, or a sparse map keyed by explicit row and column numbers. The
//! dynamic shapes are resolved once, at the grid boundary, into this tagged
//! model; [`CellGrid::add`](crate::CellGrid::add) then only dispatches on
//! variants.

use serde_json::{Map, Value};

use crate::address::parse_index;
use crate::error::{Error, Result};
use crate::value::CellValue;

/// Top-level input to [`CellGrid::add`](crate::CellGrid::add).
#[derive(Debug, Clone, PartialEq)]
pub enum BatchInput {
    /// "Array form": outer index i places row i+1.
    Rows(Vec<RowInput>),
    /// "Object form": each key is an absolute 1-based row number.
    Sparse(Vec<(u32, SparseRow)>),
}

/// One row of array-form input.
#[derive(Debug, Clone, PartialEq)]
pub enum RowInput {
    /// A bare value: a single-column row, placed at column 1.
    Cell(CellInput),
    /// A nested sequence: inner index j places column j+1.
    Cells(Vec<CellInput>),
}

/// The value under a row key in object-form input.
#[derive(Debug, Clone, PartialEq)]
pub enum SparseRow {
    /// A sequence, placed via array form at row offset `row - 1`.
    Rows(Vec<RowInput>),
    /// A map from 1-based column number to cell or nested block.
    Columns(Vec<(u32, ColumnInput)>),
}

/// The value under a column key in object-form input.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnInput {
    /// A single cell, placed at exactly (row, col).
    Cell(CellInput),
    /// A nested 2D block, placed via array form at offsets (row-1, col-1).
    Block(Vec<RowInput>),
}

/// A single cell's worth of input.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    /// A bare literal value.
    Value(CellValue),
    /// An entry-shaped object carrying per-cell attributes.
    Entry(EntrySpec),
}

/// Per-cell attributes for entry-shaped input.
///
/// `extra` holds passthrough fields the caller attached to the entry; they
/// are preserved on the stored cell but never interpreted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntrySpec {
    pub value: Option<CellValue>,
    pub name: Option<String>,
    /// Marks an entry that intentionally carries no literal value yet,
    /// suppressing the missing-value diagnostic.
    pub ref_only: bool,
    pub extra: Map<String, Value>,
}

impl EntrySpec {
    pub fn named(name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self {
            value: Some(value.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ref_only: true,
            ..Default::default()
        }
    }
}

impl BatchInput {
    /// Convert arbitrary JSON into batch input.
    ///
    /// Arrays become array form; objects become object form with keys
    /// leniently coerced to row/column numbers; scalars inside become
    /// literal values and objects inside become entry specs. A bare
    /// top-level scalar is a single cell at (1, 1).
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(BatchInput::Rows(
                items.into_iter().map(row_from_json).collect::<Result<_>>()?,
            )),
            Value::Object(map) => {
                let mut rows = Vec::with_capacity(map.len());
                for (key, val) in map {
                    rows.push((parse_index(&key)?, sparse_row_from_json(val)?));
                }
                Ok(BatchInput::Sparse(rows))
            }
            other => Ok(BatchInput::Rows(vec![RowInput::Cell(cell_from_json(
                other,
            )?)])),
        }
    }
}

fn row_from_json(value: Value) -> Result<RowInput> {
    match value {
        Value::Array(items) => Ok(RowInput::Cells(
            items
                .into_iter()
                .map(cell_from_json)
                .collect::<Result<_>>()?,
        )),
        other => Ok(RowInput::Cell(cell_from_json(other)?)),
    }
}

fn sparse_row_from_json(value: Value) -> Result<SparseRow> {
    match value {
        Value::Array(items) => Ok(SparseRow::Rows(
            items.into_iter().map(row_from_json).collect::<Result<_>>()?,
        )),
        Value::Object(map) => {
            let mut cols = Vec::with_capacity(map.len());
            for (key, val) in map {
                cols.push((parse_index(&key)?, column_from_json(val)?));
            }
            Ok(SparseRow::Columns(cols))
        }
        other => Err(Error::InvalidInput(format!(
            "row value must be a sequence or a column map, got {other}"
        ))),
    }
}

fn column_from_json(value: Value) -> Result<ColumnInput> {
    match value {
        Value::Array(items) => Ok(ColumnInput::Block(
            items.into_iter().map(row_from_json).collect::<Result<_>>()?,
        )),
        other => Ok(ColumnInput::Cell(cell_from_json(other)?)),
    }
}

fn cell_from_json(value: Value) -> Result<CellInput> {
    match value {
        Value::String(s) => Ok(CellInput::Value(CellValue::Text(s))),
        Value::Number(n) => {
            let n = n
                .as_f64()
                .ok_or_else(|| Error::InvalidInput(format!("unrepresentable number {n}")))?;
            Ok(CellInput::Value(CellValue::Number(n)))
        }
        Value::Object(map) => Ok(CellInput::Entry(entry_from_json(map)?)),
        other => Err(Error::InvalidInput(format!(
            "cell value must be a string, number, or entry object, got {other}"
        ))),
    }
}

fn entry_from_json(map: Map<String, Value>) -> Result<EntrySpec> {
    let mut spec = EntrySpec::default();
    for (key, val) in map {
        match key.as_str() {
            "val" => {
                spec.value = match val {
                    Value::Null => None,
                    Value::String(s) => Some(CellValue::Text(s)),
                    Value::Number(n) => Some(CellValue::Number(n.as_f64().ok_or_else(
                        || Error::InvalidInput(format!("unrepresentable number {n}")),
                    )?)),
                    other => {
                        return Err(Error::InvalidInput(format!(
                            "'val' must be a string or number, got {other}"
                        )))
                    }
                };
            }
            "name" => match val {
                Value::String(s) => spec.name = Some(s),
                other => {
                    return Err(Error::InvalidInput(format!(
                        "'name' must be a string, got {other}"
                    )))
                }
            },
            "ref" => spec.ref_only = !matches!(val, Value::Null | Value::Bool(false)),
            _ => {
                spec.extra.insert(key, val);
            }
        }
    }
    Ok(spec)
}

impl From<Vec<Vec<CellValue>>> for BatchInput {
    fn from(rows: Vec<Vec<CellValue>>) -> Self {
        BatchInput::Rows(
            rows.into_iter()
                .map(|cells| RowInput::Cells(cells.into_iter().map(CellInput::Value).collect()))
                .collect(),
        )
    }
}

impl From<Vec<CellValue>> for BatchInput {
    fn from(cells: Vec<CellValue>) -> Self {
        BatchInput::Rows(
            cells
                .into_iter()
                .map(|c| RowInput::Cell(CellInput::Value(c)))
                .collect(),
        )
    }
}
