//! Outbound batch envelope
//!
//! The update batch is an Atom feed with one `<entry>` per cell, each
//! carrying a `UpdateR{row}C{col}` batch id, an update operation marker, the
//! cell's canonical resource URL, and a `gs:cell` element whose `inputValue`
//! attribute holds the escaped, reference-resolved value.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use gridfeed_core::{resolve_references, Address, CellGrid, CellValue};

/// Incrementally rendered batch feed.
pub struct BatchEnvelope {
    base_url: String,
    entries: Vec<String>,
}

impl BatchEnvelope {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            entries: Vec::new(),
        }
    }

    /// Append one cell record. `value` must already be reference-resolved;
    /// it is attribute-escaped here.
    pub fn push(&mut self, address: Address, value: &str) {
        let Address { row, col } = address;
        let base = &self.base_url;
        let val = escape(value);
        self.entries.push(format!(
            "<entry>\n\
             \x20 <batch:id>UpdateR{row}C{col}</batch:id>\n\
             \x20 <batch:operation type=\"update\"/>\n\
             \x20 <id>{base}/R{row}C{col}</id>\n\
             \x20 <link rel=\"edit\" type=\"application/atom+xml\"\n\
             \x20 href=\"{base}/R{row}C{col}\"/>\n\
             \x20 <gs:cell row=\"{row}\" col=\"{col}\" inputValue='{val}'/>\n\
             </entry>\n"
        ));
    }

    /// Render the feed wrapper around the accumulated entries. An envelope
    /// with no entries is still a valid feed.
    pub fn finish(self) -> String {
        format!(
            "<feed xmlns=\"http://www.w3.org/2005/Atom\"\n\
             \x20 xmlns:batch=\"http://schemas.google.com/gdata/batch\"\n\
             \x20 xmlns:gs=\"http://schemas.google.com/spreadsheets/2006\">\n\
             <id>{}</id>\n\
             {}\n\
             </feed>\n",
            self.base_url,
            self.entries.join("\n")
        )
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compile a grid into the outbound batch payload.
///
/// Text values are run through the reference resolver against the grid's
/// name index; entries with no value after resolution are skipped. The grid
/// itself is not mutated, so a failed send can simply be retried.
pub fn compile_grid(grid: &CellGrid, base_url: &str) -> String {
    let mut envelope = BatchEnvelope::new(base_url);
    for entry in grid.entries() {
        let resolved = match &entry.value {
            Some(CellValue::Text(text)) => {
                Some(resolve_references(text, entry.address, grid.names()))
            }
            Some(CellValue::Number(n)) => Some(n.to_string()),
            None => None,
        };
        if let Some(value) = resolved {
            envelope.push(entry.address, &value);
        }
    }
    envelope.finish()
}

/// Scan a batch response for the service's failure marker.
///
/// The service reports per-entry outcomes as `batch:status` elements; any
/// element with `success='0'` means the batch (partially) failed. Returns
/// the reported reason when the batch failed, `None` on success. Bodies
/// that do not scan as XML fall back to a plain-text marker check, matching
/// what the service's clients have always keyed on.
pub fn batch_failed(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let mut failed = false;
                let mut reason = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"success" if attr.value.as_ref() == b"0" => failed = true,
                        b"reason" => {
                            reason = attr.unescape_value().ok().map(|v| v.into_owned());
                        }
                        _ => {}
                    }
                }
                if failed {
                    return Some(reason.unwrap_or_else(|| "batch entry failed".to_string()));
                }
            }
            Ok(Event::Eof) => return None,
            Ok(_) => {}
            Err(_) => {
                if body.contains("success='0'") || body.contains("success=\"0\"") {
                    return Some("batch entry failed".to_string());
                }
                return None;
            }
        }
    }
}
