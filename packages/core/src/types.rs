use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field names the dashboard pipeline reads by name.
///
/// Records carry no enforced schema; every one of these may be absent.
pub mod fields {
    pub const ANIMAL_ID: &str = "animal_id";
    pub const ANIMAL_TYPE: &str = "animal_type";
    pub const BREED: &str = "breed";
    pub const NAME: &str = "name";
    pub const SEX_UPON_OUTCOME: &str = "sex_upon_outcome";
    pub const AGE_UPON_OUTCOME_IN_WEEKS: &str = "age_upon_outcome_in_weeks";
    pub const LOCATION_LAT: &str = "location_lat";
    pub const LOCATION_LONG: &str = "location_long";
}

/// Scalar value held by a record field.
///
/// Serializes untagged so records read and write as plain JSON objects.
/// `Int` is tried before `Float` so whole numbers keep their integer type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// JSON null, or a missing CSV cell.
    #[default]
    Null,
    /// JSON boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit IEEE 754 float.
    Float(f64),
    /// UTF-8 string.
    String(String),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string slice for `String` values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value of `Int` and `Float` values only.
    ///
    /// Strings are never treated as numbers here; range predicates rely on
    /// this to match only numerically typed fields.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Lenient numeric read: numbers as-is, strings parsed after trimming.
    ///
    /// Returns `None` for anything that does not yield a finite number,
    /// including `"nan"` and infinities.
    #[must_use]
    pub fn parse_finite(&self) -> Option<f64> {
        let n = match self {
            Self::String(s) => s.trim().parse::<f64>().ok()?,
            other => other.as_number()?,
        };
        n.is_finite().then_some(n)
    }

    /// Equality with numeric widening: `Int(2)` equals `Float(2.0)`.
    ///
    /// Comparisons are exact. A float matches an integer only when it is
    /// integral and converts to that same integer.
    #[must_use]
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Int(i), Self::Float(f)) | (Self::Float(f), Self::Int(i)) => {
                float_equals_int(*f, *i)
            }
            _ => self == other,
        }
    }

    /// String coercion used for searching and labelling. `Null` becomes empty.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }
}

// 2^63 is exactly representable; `as` saturates, so bound the range first.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_equals_int(f: f64, i: i64) -> bool {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&f) && f as i64 == i
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One animal outcome: an ordered mapping from field name to [`Value`].
///
/// Field order is insertion order and survives serialization, which keeps
/// text search and column discovery deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Builder-style insert, convenient for fixtures.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets a field, returning the previous value if any. Existing fields
    /// keep their position.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the field value unless it is absent or `Null`.
    #[must_use]
    pub fn get_present(&self, field: &str) -> Option<&Value> {
        self.get(field).filter(|v| !v.is_null())
    }

    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    #[must_use]
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Copies every field of `other` onto this record (a `$set` update).
    pub fn merge(&mut self, other: &Record) {
        for (field, value) in other.iter() {
            self.0.insert(field.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
