//! Mapping resolved values onto spreadsheet cell types

use chrono::{NaiveDate, NaiveDateTime};

use crate::data::Value;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// What a cell holds after substitution
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellContent {
    /// Numeric cell (`<v>` holds the number); dates end up here as serials
    Number(f64),
    /// Boolean cell (`t="b"`, raw `1` / `0`)
    Boolean(bool),
    /// Text cell, stored through the shared-string table
    Text(String),
}

impl CellContent {
    /// The raw `<v>` text for numbers and booleans, or the text itself
    pub fn raw(&self) -> String {
        match self {
            CellContent::Number(n) => format!("{n}"),
            CellContent::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            CellContent::Text(s) => s.clone(),
        }
    }
}

/// Decide the cell type for a resolved value.
///
/// `None` means the cell is left empty: the value was undefined, null, a
/// non-finite number, or a date Excel cannot represent.
///
/// ```
/// use stencil_sheets_core::{classify, CellContent, Value};
///
/// assert_eq!(classify(Some(&Value::Bool(true))), Some(CellContent::Boolean(true)));
/// assert_eq!(classify(Some(&Value::Number(f64::NAN))), None);
/// assert_eq!(classify(None), None);
/// ```
pub fn classify(value: Option<&Value>) -> Option<CellContent> {
    match value? {
        Value::Null => None,
        Value::Number(n) if n.is_finite() => Some(CellContent::Number(*n)),
        Value::Number(_) => None,
        Value::Date(date) => excel_serial(date).map(CellContent::Number),
        Value::Bool(b) => Some(CellContent::Boolean(*b)),
        other => Some(CellContent::Text(to_text(other))),
    }
}

/// Days since 1899-12-30 (Excel's 1900 date system), time of day as the
/// fractional part.
///
/// Returns `None` for dates before the epoch or after 9999-12-31, which Excel
/// cannot display.
pub fn excel_serial(date: &NaiveDateTime) -> Option<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let last = NaiveDate::from_ymd_opt(9999, 12, 31)?;
    if *date < epoch || date.date() > last {
        return None;
    }
    let millis = date.signed_duration_since(epoch).num_milliseconds();
    Some(millis as f64 / MILLIS_PER_DAY)
}

/// Text form of a value, used for text cells and for placeholders embedded
/// in longer text.
///
/// Mappings render as JSON, sequences join each element's own text with a
/// comma, integral numbers print without a fractional part.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::Text(s) => s.clone(),
        Value::Date(d) => {
            if d.time() == chrono::NaiveTime::MIN {
                d.format("%Y-%m-%d").to_string()
            } else {
                d.format("%Y-%m-%d %H:%M:%S").to_string()
            }
        }
        Value::Sequence(items) => items.iter().map(to_text).collect::<Vec<_>>().join(","),
        Value::Mapping(_) => value.to_json().to_string(),
    }
}

/// Format a number the way a reader expects to see it in text
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
