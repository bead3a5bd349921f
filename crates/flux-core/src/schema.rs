//! Row schemas and the per-field casts `schematize` applies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
}

impl FieldType {
    /// Value substituted for a blank cell before casting.
    pub fn default_value(self) -> Value {
        match self {
            FieldType::Bool => Value::Bool(false),
            FieldType::Int => Value::Int(0),
            FieldType::Float => Value::Float(0.0),
            FieldType::Str => Value::Str(String::new()),
        }
    }

    /// Whether `value` already has this type.
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Bool, Value::Bool(_))
                | (FieldType::Int, Value::Int(_))
                | (FieldType::Float, Value::Float(_))
                | (FieldType::Str, Value::Str(_))
        )
    }

    /// Cast one cell. Blank cells (null, empty string) become the default.
    pub fn cast(self, value: &Value) -> Result<Value> {
        if value.is_blank() {
            return Ok(self.default_value());
        }
        let fail = || {
            Error::Cast(format!(
                "cannot cast {} value {} to {}",
                value.type_name(),
                value,
                self
            ))
        };
        match self {
            FieldType::Str => Ok(Value::Str(value.to_string())),
            FieldType::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::Int(i) => Ok(Value::Bool(*i != 0)),
                Value::Float(f) => Ok(Value::Bool(*f != 0.0)),
                Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
                    "false" | "f" | "no" | "n" | "0" => Ok(Value::Bool(false)),
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },
            FieldType::Int => match value {
                Value::Int(i) => Ok(Value::Int(*i)),
                Value::Bool(b) => Ok(Value::Int(*b as i64)),
                Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
                Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| fail()),
                _ => Err(fail()),
            },
            FieldType::Float => match value {
                Value::Float(f) => Ok(Value::Float(*f)),
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| fail()),
                _ => Err(fail()),
            },
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Str => "str",
        };
        f.write_str(name)
    }
}

/// One `(name, type, hint)` schema entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub hint: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&FieldDescriptor> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// A row fits when it is a list of the schema's arity. An empty schema
    /// accepts any list.
    pub fn fits(&self, row: &Value) -> bool {
        match row {
            Value::List(cells) => self.is_empty() || cells.len() == self.len(),
            _ => false,
        }
    }

    /// Cast every cell of `row` according to `mode`.
    ///
    /// Returns `Ok(None)` when the row is dropped (`SkipBadRows`).
    pub fn cast_row(&self, row: Value, mode: CastMode) -> Result<Option<Value>> {
        if self.is_empty() && matches!(row, Value::List(_)) {
            return Ok(Some(row));
        }
        let cells = match row {
            Value::List(cells) if cells.len() == self.len() => cells,
            other => {
                if mode == CastMode::SkipBadRows {
                    return Ok(None);
                }
                return Err(Error::Validation(format!(
                    "row {} does not fit schema of {} fields",
                    other,
                    self.len()
                )));
            }
        };

        let mut out = Vec::with_capacity(cells.len());
        for (cell, desc) in cells.iter().zip(&self.fields) {
            match desc.field_type.cast(cell) {
                Ok(v) => out.push(v),
                Err(e) => match mode {
                    CastMode::Strict => {
                        return Err(Error::Cast(format!("field '{}': {}", desc.name, e)))
                    }
                    CastMode::SkipBadValues => out.push(Value::Null),
                    CastMode::SkipBadRows => return Ok(None),
                },
            }
        }
        Ok(Some(Value::List(out)))
    }
}

/// What `schematize` does with a cell it cannot cast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastMode {
    /// Abort the pipeline with a cast error.
    #[default]
    Strict,
    /// Replace the offending cell with null and keep the row.
    SkipBadValues,
    /// Drop the whole row.
    SkipBadRows,
}

impl CastMode {
    /// Whether rows can disappear, which makes the output count unknowable.
    pub fn drops_rows(self) -> bool {
        self == CastMode::SkipBadRows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldDescriptor::new("id", FieldType::Int),
            FieldDescriptor::new("score", FieldType::Float),
            FieldDescriptor::new("active", FieldType::Bool).with_hint("flag"),
            FieldDescriptor::new("name", FieldType::Str),
        ])
    }

    #[test]
    fn casts_text_cells() {
        let row = Value::List(vec!["7".into(), " 2.5 ".into(), "yes".into(), "bob".into()]);
        let out = schema()
            .cast_row(row, CastMode::Strict)
            .expect("cast")
            .expect("row kept");
        assert_eq!(
            out,
            Value::List(vec![
                Value::Int(7),
                Value::Float(2.5),
                Value::Bool(true),
                Value::from("bob"),
            ])
        );
    }

    #[test]
    fn blank_numeric_cells_get_defaults() {
        let row = Value::List(vec![Value::Null, "".into(), Value::Null, Value::Null]);
        let out = schema()
            .cast_row(row, CastMode::Strict)
            .expect("cast")
            .expect("row kept");
        assert_eq!(
            out,
            Value::List(vec![
                Value::Int(0),
                Value::Float(0.0),
                Value::Bool(false),
                Value::from(""),
            ])
        );
    }

    #[test]
    fn cast_modes() {
        let bad = || Value::List(vec!["x".into(), "1".into(), "true".into(), "n".into()]);

        let err = schema().cast_row(bad(), CastMode::Strict).unwrap_err();
        assert!(matches!(err, Error::Cast(ref m) if m.contains("'id'")));

        let kept = schema()
            .cast_row(bad(), CastMode::SkipBadValues)
            .expect("cast")
            .expect("row kept");
        assert_eq!(kept.as_list().map(|c| c[0].clone()), Some(Value::Null));

        assert!(schema()
            .cast_row(bad(), CastMode::SkipBadRows)
            .expect("cast")
            .is_none());
    }

    #[test]
    fn arity_mismatch_is_validation() {
        let short = Value::List(vec!["1".into()]);
        assert!(matches!(
            schema().cast_row(short.clone(), CastMode::Strict),
            Err(Error::Validation(_))
        ));
        assert!(schema()
            .cast_row(short, CastMode::SkipBadRows)
            .expect("cast")
            .is_none());
    }

    #[test]
    fn fits_checks_arity_only() {
        let s = schema();
        assert!(s.fits(&Value::List(vec![Value::Null; 4])));
        assert!(!s.fits(&Value::List(vec![Value::Null; 3])));
        assert!(!s.fits(&Value::from("row")));
        assert!(Schema::default().fits(&Value::List(vec![])));
    }

    #[test]
    fn float_truncates_to_int() {
        assert_eq!(FieldType::Int.cast(&Value::Float(3.9)).expect("cast"), Value::Int(3));
        assert!(FieldType::Int.cast(&Value::from("3.9")).is_err());
    }
}
