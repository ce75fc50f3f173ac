//! The data context placeholders are resolved against

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

use crate::accessor::{Accessor, Segment};

/// A value in the data context
///
/// Dates are calendar wall-clock values: a `DateTime` in any time zone is
/// stored as the local date and time it names, so the cell shows the same
/// calendar date the caller had in mind.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Explicit null
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Any number
    Number(f64),
    /// Text
    Text(String),
    /// Calendar date and time
    Date(NaiveDateTime),
    /// Ordered list
    Sequence(Vec<Value>),
    /// String-keyed map
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Build a mapping from key/value pairs
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Look up a field of a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// Resolve an accessor against this value, see [`resolve`]
    pub fn resolve(&self, accessor: &Accessor) -> Option<Value> {
        resolve(self, accessor.segments())
    }

    /// Get the type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// Convert text that spells an ISO date (`2013-06-01`) or date-time
    /// (`2013-06-01T08:30:00`, optionally with an offset) into [`Value::Date`],
    /// recursively. Other values are returned unchanged.
    ///
    /// JSON has no date type, so callers feeding JSON use this to opt in.
    pub fn parse_dates(self) -> Value {
        match self {
            Value::Text(text) => match parse_date_text(&text) {
                Some(date) => Value::Date(date),
                None => Value::Text(text),
            },
            Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::parse_dates).collect())
            }
            Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, v.parse_dates()))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Convert into JSON, dates as ISO 8601 text
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serde_json::Value::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Walk `segments` through `context`.
///
/// - A missing field or out-of-range index yields `None`.
/// - A key applied to a sequence broadcasts: the remaining path is resolved
///   against every element and the results are collected into a sequence
///   (elements that miss become [`Value::Null`] so positions line up).
/// - An index applied to a sequence selects one element.
/// - An index applied to a mapping looks up the key spelled by the number.
///
/// ```
/// use stencil_sheets_core::{Accessor, Value};
///
/// let data: Value = serde_json::json!({
///     "items": [{"name": "X"}, {"name": "Y"}]
/// }).into();
///
/// assert_eq!(
///     data.resolve(&Accessor::parse("items.name")),
///     Some(Value::Sequence(vec!["X".into(), "Y".into()]))
/// );
/// ```
pub fn resolve(context: &Value, segments: &[Segment]) -> Option<Value> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(context.clone());
    };

    match (context, first) {
        (Value::Sequence(items), Segment::Index(i)) => {
            items.get(*i).and_then(|item| resolve(item, rest))
        }
        (Value::Sequence(items), Segment::Key(_)) => Some(Value::Sequence(
            items
                .iter()
                .map(|item| resolve(item, segments).unwrap_or(Value::Null))
                .collect(),
        )),
        (Value::Mapping(map), Segment::Key(key)) => {
            map.get(key).and_then(|value| resolve(value, rest))
        }
        (Value::Mapping(map), Segment::Index(i)) => map
            .get(&i.to_string())
            .and_then(|value| resolve(value, rest)),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::classify::to_text(self))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d.and_time(chrono::NaiveTime::MIN))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(d: DateTime<Tz>) -> Self {
        Value::Date(d.naive_local())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<V: Into<Value>> From<BTreeMap<String, V>> for Value {
    fn from(map: BTreeMap<String, V>) -> Self {
        Value::mapping(map)
    }
}

impl<V: Into<Value>> From<HashMap<String, V>> for Value {
    fn from(map: HashMap<String, V>) -> Self {
        Value::mapping(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}
