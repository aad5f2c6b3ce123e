//! Cell addresses and the R1C1 wire token

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A cell address: a 1-based (row, column) pair.
///
/// The remote service addresses cells as `R{row}C{col}` with both indices
/// starting at 1. `Address` keeps that convention rather than translating to
/// a 0-based internal form, so a value round-trips through the wire token
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    /// Row index (1-based)
    pub row: u32,
    /// Column index (1-based)
    pub col: u32,
}

impl Address {
    /// Create a new address. Fails if either index is zero.
    pub fn new(row: u32, col: u32) -> Result<Self> {
        if row == 0 || col == 0 {
            return Err(Error::InvalidAddress(format!(
                "row and column must be >= 1, got R{row}C{col}"
            )));
        }
        Ok(Self { row, col })
    }

    /// The canonical wire token for this address, e.g. `R5C2`.
    pub fn to_wire(self) -> String {
        wire_token(self.row as i64, self.col as i64)
    }

    /// Parse a wire token back into an address. Bijective with [`to_wire`].
    ///
    /// [`to_wire`]: Address::to_wire
    pub fn parse_wire(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix('R')
            .ok_or_else(|| Error::InvalidAddress(format!("missing 'R' in '{s}'")))?;
        let (row_str, col_str) = rest
            .split_once('C')
            .ok_or_else(|| Error::InvalidAddress(format!("missing 'C' in '{s}'")))?;
        Self::new(parse_index(row_str)?, parse_index(col_str)?)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}C{}", self.row, self.col)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_wire(s)
    }
}

/// Format a wire token from signed indices.
///
/// Relative references may offset an address below row or column 1; the
/// resolver emits whatever falls out (`R0C-1` included) and leaves rejection
/// to the remote service, so this helper takes `i64` rather than [`Address`].
pub fn wire_token(row: i64, col: i64) -> String {
    format!("R{row}C{col}")
}

/// Leniently coerce a row/column key into a 1-based index.
///
/// Callers supply keys as strings or numbers interchangeably; both `"3"` and
/// `3` mean row 3. Anything that is not a positive integer fails.
pub fn parse_index(token: &str) -> Result<u32> {
    let token = token.trim();
    match token.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(Error::InvalidAddress(format!(
            "expected a positive integer index, got '{token}'"
        ))),
    }
}
