//! Moving references after rows and columns were inserted
//!
//! The expansion engine records, in template coordinates, how many extra
//! rows each source row turned into and how many extra columns each source
//! cell turned into. [`Insertions`] then maps any template position or range
//! onto the rendered sheet:
//!
//! - a position after an expanded row (or column) moves by the extra count;
//! - a range whose last row (or column) is an expanded one grows to cover
//!   the copies ([`Insertions::shift_range`]);
//! - a merged area keeps its size and is anchored on the last copy of its
//!   first cell ([`Insertions::move_range`]);
//! - a formula range follows the first copy of each corner
//!   ([`Insertions::map_range`]).
//!
//! Column insertions differ from row to row. A range uses the largest
//! column shift found among the template rows it spans, which is exact for
//! single-row ranges and an approximation for taller ones.

use std::collections::BTreeMap;

use crate::reference::{CellAddress, CellRange};

/// Rows and columns added while rendering one worksheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Insertions {
    /// Template row (0-based) -> extra rows emitted after it
    rows: BTreeMap<u32, u32>,
    /// Template row (0-based) -> template column (0-based) -> extra columns
    columns: BTreeMap<u32, BTreeMap<u32, u32>>,
}

impl Insertions {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing was inserted
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    /// Record `extra` rows emitted after template row `row`
    pub fn insert_rows(&mut self, row: u32, extra: u32) {
        if extra > 0 {
            *self.rows.entry(row).or_default() += extra;
        }
    }

    /// Record `extra` columns emitted after template cell (`row`, `col`)
    pub fn insert_columns(&mut self, row: u32, col: u32, extra: u32) {
        if extra > 0 {
            *self
                .columns
                .entry(row)
                .or_default()
                .entry(col)
                .or_default() += extra;
        }
    }

    /// Extra rows emitted for template row `row` itself
    pub fn row_extra(&self, row: u32) -> u32 {
        self.rows.get(&row).copied().unwrap_or(0)
    }

    /// Rendered row of the first copy of template row `row`
    pub fn map_row(&self, row: u32) -> u32 {
        row.saturating_add(self.rows.range(..row).map(|(_, n)| n).sum::<u32>())
    }

    /// Rendered row of the last copy of template row `row`
    pub fn map_row_end(&self, row: u32) -> u32 {
        row.saturating_add(self.rows.range(..=row).map(|(_, n)| n).sum::<u32>())
    }

    /// Rendered column of template cell (`row`, `col`)
    pub fn map_col(&self, row: u32, col: u32) -> u32 {
        col.saturating_add(self.columns_in_row(row, |c| c < col))
    }

    /// Rendered column of the last cell template cell (`row`, `col`) became
    pub fn map_col_end(&self, row: u32, col: u32) -> u32 {
        col.saturating_add(self.columns_in_row(row, |c| c <= col))
    }

    fn columns_in_row<F>(&self, row: u32, include: F) -> u32
    where
        F: Fn(u32) -> bool,
    {
        self.columns
            .get(&row)
            .map(|cols| {
                cols.iter()
                    .filter(|(c, _)| include(**c))
                    .map(|(_, n)| *n)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Largest column shift among template rows `top..=bottom`
    fn max_column_shift<F>(&self, top: u32, bottom: u32, shift: F) -> u32
    where
        F: Fn(u32) -> u32,
    {
        self.columns
            .range(top..=bottom)
            .map(|(row, _)| shift(*row))
            .max()
            .unwrap_or(0)
    }

    /// Move a single cell address
    pub fn shift_address(&self, addr: &CellAddress) -> CellAddress {
        addr.moved_to(self.map_row(addr.row), self.map_col(addr.row, addr.col))
    }

    /// Move and grow a range
    pub fn shift_range(&self, range: &CellRange) -> CellRange {
        let (top, left) = (range.start.row, range.start.col);
        let (bottom, right) = (range.end.row, range.end.col);

        let left_shift =
            self.max_column_shift(top, bottom, |row| self.map_col(row, left) - left);
        let right_shift =
            self.max_column_shift(top, bottom, |row| self.map_col_end(row, right) - right);

        range.moved_to(
            (self.map_row(top), left + left_shift),
            (self.map_row_end(bottom), right + right_shift),
        )
    }

    /// Move a range without resizing it.
    ///
    /// The top-left corner follows the last copy of its cell, so cells
    /// inserted by an expanded corner stay outside the range.
    pub fn move_range(&self, range: &CellRange) -> CellRange {
        let (top, left) = (range.start.row, range.start.col);
        let (height, width) = (range.end.row - top, range.end.col - left);

        let left_shift =
            self.max_column_shift(top, range.end.row, |row| self.map_col_end(row, left) - left);
        let row = self.map_row_end(top);
        let col = left + left_shift;

        range.moved_to((row, col), (row + height, col + width))
    }

    /// Move both corners of a range to the first copy of their cells
    pub fn map_range(&self, range: &CellRange) -> CellRange {
        let (top, left) = (range.start.row, range.start.col);
        let (bottom, right) = (range.end.row, range.end.col);

        let left_shift = self.max_column_shift(top, bottom, |row| self.map_col(row, left) - left);
        let right_shift =
            self.max_column_shift(top, bottom, |row| self.map_col(row, right) - right);

        range.moved_to(
            (self.map_row(top), left + left_shift),
            (self.map_row(bottom), right + right_shift),
        )
    }

    /// Shift a space-separated list of references (`sqref` attributes).
    ///
    /// Items that are not A1 cells or ranges (whole columns such as `A:A`)
    /// are kept as written.
    pub fn shift_sqref(&self, sqref: &str) -> String {
        sqref
            .split_whitespace()
            .map(|item| match CellRange::parse(item) {
                Ok(range) => self.shift_range(&range).to_string(),
                Err(_) => item.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Shift references qualified with `sheet` inside a formula such as a
    /// defined name (`'My Sheet'!$A$1:$B$4`).
    ///
    /// Unqualified references and references to other sheets are untouched,
    /// as is anything inside string literals.
    pub fn shift_sheet_refs(&self, formula: &str, sheet: &str) -> String {
        let mut out = String::with_capacity(formula.len());
        let mut rest = formula;

        while let Some(c) = rest.chars().next() {
            match c {
                '"' => {
                    let len = string_literal_len(rest);
                    out.push_str(&rest[..len]);
                    rest = &rest[len..];
                }
                '\'' => {
                    let (name, len) = quoted_sheet_name(rest);
                    rest = self.shift_after_sheet(
                        &rest[..len],
                        name.as_deref(),
                        &rest[len..],
                        sheet,
                        &mut out,
                    );
                }
                c if c.is_alphanumeric() || c == '_' => {
                    let len = rest
                        .find(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '.'))
                        .unwrap_or(rest.len());
                    let word = &rest[..len];
                    rest = self.shift_after_sheet(word, Some(word), &rest[len..], sheet, &mut out);
                }
                _ => {
                    out.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }

        out
    }

    /// Having read a possible sheet name (`prefix`), shift the reference
    /// following its `!` when the name matches. Returns the unconsumed rest.
    fn shift_after_sheet<'a>(
        &self,
        prefix: &str,
        name: Option<&str>,
        rest: &'a str,
        sheet: &str,
        out: &mut String,
    ) -> &'a str {
        out.push_str(prefix);

        let Some(after_bang) = rest.strip_prefix('!') else {
            return rest;
        };
        out.push('!');

        let len = after_bang
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '$' || ch == ':'))
            .unwrap_or(after_bang.len());
        let reference = &after_bang[..len];

        let matches = name.is_some_and(|n| n.eq_ignore_ascii_case(sheet));
        match CellRange::parse(reference) {
            Ok(range) if matches => out.push_str(&self.shift_range(&range).to_string()),
            _ => out.push_str(reference),
        }

        &after_bang[len..]
    }
}

/// Length of a `"..."` literal at the start of `s`, doubled quotes included
fn string_literal_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Parse a `'...'` sheet name at the start of `s` (`''` escapes a quote).
/// Returns the unescaped name and the byte length consumed.
fn quoted_sheet_name(s: &str) -> (Option<String>, usize) {
    let mut name = String::new();
    let mut chars = s.char_indices().skip(1).peekable();

    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                name.push('\'');
                continue;
            }
            return (Some(name), i + 1);
        }
        name.push(c);
    }

    (None, s.len())
}
