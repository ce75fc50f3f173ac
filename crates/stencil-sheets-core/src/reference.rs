//! Cell reference arithmetic
//!
//! Column letters use the bijective base-26 numbering spreadsheets use
//! (`A` = 1 ... `Z` = 26, `AA` = 27 ...). [`CellAddress`] and [`CellRange`]
//! keep 0-based indices internally and print 1-based A1 references.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// Convert column letters to a 1-based column index (`A` = 1, `AA` = 27).
///
/// Letters are case-insensitive. Indices larger than `u32::MAX` are rejected.
///
/// # Examples
/// ```
/// use stencil_sheets_core::reference::letters_to_index;
///
/// assert_eq!(letters_to_index("A").unwrap(), 1);
/// assert_eq!(letters_to_index("AA").unwrap(), 27);
/// assert_eq!(letters_to_index("xfd").unwrap(), 16_384);
/// ```
pub fn letters_to_index(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidColumn("empty column letters".into()));
    }

    let mut index: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidColumn(format!(
                "invalid column letter '{}' in '{}'",
                c, letters
            )));
        }
        index = index * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if index > u32::MAX as u64 {
            return Err(Error::InvalidColumn(format!("'{}' is too large", letters)));
        }
    }

    Ok(index as u32)
}

/// Convert a 1-based column index to letters (1 = `A`, 27 = `AA`).
///
/// Index 0 has no letter form and yields an empty string.
pub fn index_to_letters(index: u32) -> String {
    let mut result = String::new();
    let mut n = index;

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Build an A1-style reference from a 1-based row and column.
///
/// ```
/// use stencil_sheets_core::reference::cell_ref;
///
/// assert_eq!(cell_ref(3, 2), "B3");
/// ```
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", index_to_letters(col), row)
}

/// A cell address (e.g., "A1", "$B$2")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u32,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
}

impl CellAddress {
    /// Create a new cell address with relative references
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use stencil_sheets_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert_eq!(addr.row, 1);
    /// assert_eq!(addr.col, 1);
    /// assert!(addr.row_absolute);
    /// assert!(addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        let col_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }

        if pos == col_start {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = letters_to_index(&s[col_start..pos])
            .map_err(|_| Error::InvalidAddress(format!("invalid column in '{}'", s)))?;

        let row_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let row_str = &s[pos..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }

        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;

        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        if row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row - 1, MAX_ROWS - 1));
        }

        if col > MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col - 1, MAX_COLS - 1));
        }

        Ok(Self {
            row: row - 1,
            col: col - 1,
            row_absolute,
            col_absolute,
        })
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();

        if self.col_absolute {
            result.push('$');
        }
        result.push_str(&index_to_letters(self.col + 1));

        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&(self.row + 1).to_string());

        result
    }

    /// Copy of this address moved to a new position, keeping the `$` flags
    pub fn moved_to(&self, row: u32, col: u32) -> Self {
        Self {
            row: row.min(MAX_ROWS - 1),
            col: col.min(MAX_COLS - 1),
            ..*self
        }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A range of cells (e.g., "A1:B10")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
    /// Whether the range was written as a single cell (no colon)
    single: bool,
}

impl CellRange {
    /// Create a new cell range, normalized so `start` is the top-left corner
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        let (top, bottom) = if start.row <= end.row {
            (start.row, end.row)
        } else {
            (end.row, start.row)
        };
        let (left, right) = if start.col <= end.col {
            (start.col, end.col)
        } else {
            (end.col, start.col)
        };

        Self {
            start: start.moved_to(top, left),
            end: end.moved_to(bottom, right),
            single: false,
        }
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
            single: true,
        }
    }

    /// Parse a range from A1:B10 notation
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(colon_pos) = s.find(':') {
            let start = CellAddress::parse(&s[..colon_pos])
                .map_err(|_| Error::InvalidRange(s.to_string()))?;
            let end = CellAddress::parse(&s[colon_pos + 1..])
                .map_err(|_| Error::InvalidRange(s.to_string()))?;
            Ok(Self::new(start, end))
        } else {
            let addr = CellAddress::parse(s).map_err(|_| Error::InvalidRange(s.to_string()))?;
            Ok(Self::single(addr))
        }
    }

    /// Whether the range covers exactly one row
    pub fn is_single_row(&self) -> bool {
        self.start.row == self.end.row
    }

    /// Copy of this range with new corner positions (0-based), keeping `$` flags
    pub fn moved_to(&self, start: (u32, u32), end: (u32, u32)) -> Self {
        let moved = Self::new(
            self.start.moved_to(start.0, start.1),
            self.end.moved_to(end.0, end.1),
        );
        Self {
            single: self.single && moved.start == moved.end,
            ..moved
        }
    }

    /// Format as A1:B10 string
    pub fn to_a1_string(&self) -> String {
        if self.single && self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
