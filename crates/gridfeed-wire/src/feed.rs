//! Inbound JSON feeds
//!
//! The service answers `?alt=json` requests with a GData-style feed: text
//! values live under `$t` keys, cells under `entry[].gs$cell`, and numeric
//! fields may arrive as strings or numbers interchangeably.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;

use gridfeed_core::{parse_index, CellValue};

use crate::error::{WireError, WireResult};

/// Row-keyed, column-keyed map of retrieved cells.
pub type RowMap = BTreeMap<u32, BTreeMap<u32, RetrievedCell>>;

/// One cell as retrieved from the service.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedCell {
    /// The numeric value when the service reported one, else the display
    /// text.
    pub value: CellValue,
    /// The raw input (formula or literal) the cell was last set to.
    pub input_value: Option<String>,
}

/// An author listed in the feed metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A parsed cell feed: the row map plus feed-level metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub rows: RowMap,
    pub title: Option<String>,
    pub updated: Option<DateTime<FixedOffset>>,
    pub authors: Vec<Author>,
    /// Number of cell records in the feed.
    pub total_cells: usize,
    /// Number of distinct rows holding at least one cell.
    pub total_rows: usize,
    /// Highest row number seen; 1 when the feed was empty.
    pub last_row: u32,
    /// `last_row + 1` when any cell was present, else 1.
    pub next_row: u32,
}

#[derive(Debug, Deserialize)]
struct FeedDocument {
    feed: Option<FeedBody>,
}

#[derive(Debug, Deserialize)]
struct FeedBody {
    title: Option<TextNode>,
    updated: Option<TextNode>,
    author: Option<Vec<AuthorNode>>,
    entry: Option<Vec<FeedEntry>>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$t")]
    t: Option<String>,
}

impl TextNode {
    fn into_text(self) -> Option<String> {
        self.t
    }
}

#[derive(Debug, Deserialize)]
struct AuthorNode {
    name: Option<TextNode>,
    email: Option<TextNode>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    title: Option<TextNode>,
    id: Option<TextNode>,
    #[serde(rename = "gs$cell")]
    cell: Option<GsCell>,
}

#[derive(Debug, Deserialize)]
struct GsCell {
    row: Value,
    col: Value,
    #[serde(rename = "$t")]
    text: Option<String>,
    #[serde(rename = "numericValue")]
    numeric_value: Option<String>,
    #[serde(rename = "inputValue")]
    input_value: Option<String>,
}

/// Coerce a `row`/`col` field that may be a JSON string or number.
fn index_from_value(value: &Value) -> WireResult<u32> {
    match value {
        Value::String(s) => Ok(parse_index(s)?),
        Value::Number(n) => match n.as_u64() {
            Some(i) if i >= 1 && i <= u32::MAX as u64 => Ok(i as u32),
            _ => Err(WireError::Retrieval(format!("bad cell index: {n}"))),
        },
        other => Err(WireError::Retrieval(format!("bad cell index: {other}"))),
    }
}

impl GsCell {
    fn into_retrieved(self) -> RetrievedCell {
        let value = match self.numeric_value.as_deref().map(str::parse::<f64>) {
            Some(Ok(n)) => CellValue::Number(n),
            _ => CellValue::Text(self.text.unwrap_or_default()),
        };
        RetrievedCell {
            value,
            input_value: self.input_value,
        }
    }
}

/// Parse a cell feed body into a [`FeedSnapshot`].
///
/// A body that is not JSON is a [`WireError::Parse`]; JSON without the
/// `feed` container is a [`WireError::Retrieval`] so the caller can tell a
/// mangled payload from a well-formed refusal.
pub fn parse_cell_feed(body: &str) -> WireResult<FeedSnapshot> {
    let document: FeedDocument = serde_json::from_str(body)?;
    let feed = document
        .feed
        .ok_or_else(|| WireError::Retrieval("missing feed container".to_string()))?;

    let entries = feed.entry.unwrap_or_default();
    let total_cells = entries.len();

    let mut rows = RowMap::new();
    let mut last_row = 1u32;
    for entry in entries {
        let Some(cell) = entry.cell else {
            log::warn!("feed entry without gs$cell, skipping");
            continue;
        };
        let row = index_from_value(&cell.row)?;
        let col = index_from_value(&cell.col)?;
        last_row = last_row.max(row);
        rows.entry(row).or_default().insert(col, cell.into_retrieved());
    }

    let total_rows = rows.len();
    // Gate on placed cells, not entry count: entries without gs$cell were
    // skipped above and must not advance the append position.
    let next_row = if rows.is_empty() { 1 } else { last_row + 1 };

    Ok(FeedSnapshot {
        rows,
        title: feed.title.and_then(TextNode::into_text),
        updated: feed
            .updated
            .and_then(TextNode::into_text)
            .and_then(|t| DateTime::parse_from_rfc3339(&t).ok()),
        authors: feed
            .author
            .unwrap_or_default()
            .into_iter()
            .map(|a| Author {
                name: a.name.and_then(TextNode::into_text),
                email: a.email.and_then(TextNode::into_text),
            })
            .collect(),
        total_cells,
        total_rows,
        last_row,
        next_row,
    })
}

/// Find a resource id in a spreadsheet/worksheet list feed.
///
/// List feeds carry one entry per resource with a `title` and an `id` URL
/// whose trailing path segment is the opaque identifier. Returns `Ok(None)`
/// when no entry matches the title.
pub fn find_feed_entry_id(body: &str, title: &str) -> WireResult<Option<String>> {
    let document: FeedDocument = serde_json::from_str(body)?;
    let feed = document
        .feed
        .ok_or_else(|| WireError::Retrieval("missing feed container".to_string()))?;

    for entry in feed.entry.unwrap_or_default() {
        if entry.title.and_then(TextNode::into_text).as_deref() != Some(title) {
            continue;
        }
        let Some(id_url) = entry.id.and_then(TextNode::into_text) else {
            continue;
        };
        let id = id_url.rsplit('/').next().unwrap_or(&id_url).to_string();
        if !id.is_empty() {
            return Ok(Some(id));
        }
    }
    Ok(None)
}
