//! Dynamic item model shared by every stream variant and the spill format.
//!
//! A `Value` serializes as plain JSON (untagged), which is exactly the
//! one-item-per-line layout chunk files use. JSON has no NaN or infinity, so
//! non-finite floats are written as `{"$float": "NaN" | "inf" | "-inf"}` and
//! read back as floats.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// String-keyed record. Field order is the key order.
pub type Record = BTreeMap<String, Value>;

#[derive(Debug, Clone, Deserialize)]
#[serde(from = "JsonValue")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Record(Record),
}

/// Field name of the object form of a non-finite float.
const FLOAT_TAG: &str = "$float";

fn non_finite_name(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f > 0.0 {
        "inf"
    } else {
        "-inf"
    }
}

fn parse_non_finite(name: &str) -> Option<f64> {
    match name {
        "NaN" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(f) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(FLOAT_TAG, non_finite_name(*f))?;
                map.end()
            }
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Record(record) => record.serialize(serializer),
        }
    }
}

/// Plain JSON shape; `Value` is decoded through it so the float object form
/// can be recognized.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Record(Record),
}

impl From<JsonValue> for Value {
    fn from(raw: JsonValue) -> Self {
        match raw {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Int(i) => Value::Int(i),
            JsonValue::Float(f) => Value::Float(f),
            JsonValue::Str(s) => Value::Str(s),
            JsonValue::List(items) => Value::List(items),
            JsonValue::Record(record) => {
                let tagged = match (record.len(), record.get(FLOAT_TAG)) {
                    (1, Some(Value::Str(name))) => parse_non_finite(name),
                    _ => None,
                };
                match tagged {
                    Some(f) => Value::Float(f),
                    None => Value::Record(record),
                }
            }
        }
    }
}

impl Value {
    /// Build a two-element list, the shape `Pairs` streams carry.
    pub fn pair(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Value::List(vec![key.into(), value.into()])
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Borrow both halves of a two-element list.
    pub fn as_pair(&self) -> Option<(&Value, &Value)> {
        match self {
            Value::List(items) if items.len() == 2 => Some((&items[0], &items[1])),
            _ => None,
        }
    }

    /// Split a two-element list into its halves.
    pub fn into_pair(self) -> Result<(Value, Value)> {
        match self {
            Value::List(items) if items.len() == 2 => {
                let mut it = items.into_iter();
                match (it.next(), it.next()) {
                    (Some(k), Some(v)) => Ok((k, v)),
                    _ => Err(Error::Validation("pair lost an element".into())),
                }
            }
            other => Err(Error::Validation(format!("not a pair: {other}"))),
        }
    }

    /// Field lookup on records; anything else (or a missing field) is `Null`.
    pub fn field(&self, name: &str) -> Value {
        match self {
            Value::Record(r) => r.get(name).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Null or an empty string: the cells schema casts replace with defaults.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::List(_) => 4,
            Value::Record(_) => 5,
        }
    }
}

/// Total order used by sorting, grouping and merging.
///
/// Nulls sort first, then values are compared by type. Ints and floats compare
/// numerically; on a numeric tie the int sorts first so that distinct values
/// never compare equal.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(x), Bool(y)) => x.cmp(y),
            (Int(x), Int(y)) => x.cmp(y),
            (Float(x), Float(y)) => x.total_cmp(y),
            (Int(x), Float(y)) => (*x as f64).total_cmp(y).then(Ordering::Less),
            (Float(x), Int(y)) => x.total_cmp(&(*y as f64)).then(Ordering::Greater),
            (Str(x), Str(y)) => x.cmp(y),
            (List(x), List(y)) => x.cmp(y),
            (Record(x), Record(y)) => x.cmp(y),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        use Value::*;
        std::mem::discriminant(self).hash(state);
        match self {
            Null => {}
            Bool(b) => b.hash(state),
            Int(i) => i.hash(state),
            Float(f) => f.to_bits().hash(state),
            Str(s) => s.hash(state),
            List(items) => items.hash(state),
            Record(r) => r.hash(state),
        }
    }
}

/// Strings print raw; everything else prints as JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Float(x) if !x.is_finite() => f.write_str(non_finite_name(*x)),
            other => {
                let json = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Build a record from `(name, value)` pairs.
pub fn record<K, V, I>(fields: I) -> Record
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// One named column of a columnar batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Columnar batch handed over by columnar sources (parquet readers, data
/// frames). The columnar source turns it into a stream of records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnBatch {
    pub columns: Vec<Column>,
}

impl ColumnBatch {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// All columns must have the same number of rows.
    pub fn validate(&self) -> Result<()> {
        let rows = self.num_rows();
        for col in &self.columns {
            if col.len() != rows {
                return Err(Error::Argument(format!(
                    "column '{}' has {} rows, expected {}",
                    col.name,
                    col.len(),
                    rows
                )));
            }
        }
        Ok(())
    }

    /// Record view of one row. Out-of-range rows yield nulls.
    pub fn row_record(&self, row_idx: usize) -> Record {
        self.columns
            .iter()
            .map(|c| {
                (
                    c.name.clone(),
                    c.values.get(row_idx).cloned().unwrap_or(Value::Null),
                )
            })
            .collect()
    }
}
