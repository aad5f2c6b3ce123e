//! Reference resolution
//!
//! Text values may embed two reference forms:
//!
//! - Named: `{{ total }}` resolves to the wire token of the cell registered
//!   under that name.
//! - Relative: `{{ 1, -1 }}` resolves to the wire token of the current
//!   cell's address offset by (dr, dc).
//!
//! Resolution runs at serialization time, so a name may be registered after
//! the entries that reference it. The grammars are mutually exclusive (a
//! comma can never appear in a name), so applying the named pattern first
//! cannot feed text into the relative pattern or vice versa.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::address::wire_token;
use crate::Address;

static NAMED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([\-\w\s]*?)\s*\}\}").unwrap());

static RELATIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*(-?\d+)\s*,\s*(-?\d+)\s*\}\}").unwrap());

/// Replace all references embedded in `value` with wire address tokens.
///
/// `at` is the address of the cell the value belongs to; relative offsets
/// are computed against it with no bounds checking, so an offset walking off
/// the sheet yields tokens like `R0C-1` for the remote side to reject.
///
/// An unresolved name is dropped (substituted with the empty string) and
/// logged, never left verbatim.
pub fn resolve_references(value: &str, at: Address, names: &HashMap<String, Address>) -> String {
    let named = NAMED.replace_all(value, |caps: &Captures| match names.get(&caps[1]) {
        Some(target) => target.to_wire(),
        None => {
            log::warn!("could not find name: {}", &caps[1]);
            String::new()
        }
    });

    RELATIVE
        .replace_all(&named, |caps: &Captures| {
            let dr = parse_offset(&caps[1]);
            let dc = parse_offset(&caps[2]);
            wire_token(at.row as i64 + dr, at.col as i64 + dc)
        })
        .into_owned()
}

/// An offset the pattern matched but `i64` cannot hold is treated as zero.
fn parse_offset(digits: &str) -> i64 {
    digits.parse().unwrap_or_else(|_| {
        log::warn!("offset {digits} out of range, using 0");
        0
    })
}
