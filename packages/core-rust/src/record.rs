//! Record model shared by every resource.
//!
//! A [`Record`] is an opaque field-name -> JSON value mapping. The backend owns
//! the schema; this crate only knows the few system fields every table carries
//! (`Id`, `Name`, `Tags`, `CreatedOn`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Integer record identifier assigned by the backend.
pub type RecordId = i64;

/// System field holding the record identifier.
pub const ID_FIELD: &str = "Id";
/// System field holding the display name.
pub const NAME_FIELD: &str = "Name";
/// System field holding comma-separated tags.
pub const TAGS_FIELD: &str = "Tags";
/// System field holding the creation timestamp (ISO-8601).
pub const CREATED_ON_FIELD: &str = "CreatedOn";

/// A single backend record.
///
/// Serializes transparently as a JSON object so it can be placed directly in
/// write batches and read back out of response envelopes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record's `Id`, coerced to an integer.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.fields.get(ID_FIELD).and_then(coerce_id)
    }

    /// Returns a field value. Unprojected fields are simply absent.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a field value if it is a string.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Returns `true` if the field is present and not `null`.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|v| !v.is_null())
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Number of fields present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrows the underlying field map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the record, returning the underlying field map.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.fields)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Coerces an identifier value to an integer.
///
/// Numbers are truncated toward zero. Strings use leading-integer parsing:
/// optional surrounding whitespace, an optional sign, then as many ASCII
/// digits as are present (`"12abc"` -> 12). Anything else yields `None`.
#[must_use]
pub fn coerce_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < 9.0e18)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

/// Coerces an identifier to its wire form: an integer, or `null` when it
/// cannot be parsed.
#[must_use]
pub fn coerce_id_value(value: &Value) -> Value {
    coerce_id(value).map_or(Value::Null, Value::from)
}

fn parse_leading_int(s: &str) -> Option<RecordId> {
    let trimmed = s.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: RecordId = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
