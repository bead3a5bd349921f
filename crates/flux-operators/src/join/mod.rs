//! Joins. Only the map-side (broadcast) join exists: the right side is held
//! in a hash map and the left side streams past it once.

pub mod map_side;

use std::fmt;
use std::str::FromStr;

use flux_core::{Error, Value};
use serde::{Deserialize, Serialize};

pub use map_side::map_side_join;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Left,
    Right,
    Inner,
    #[serde(alias = "full")]
    Outer,
}

impl JoinType {
    /// Left items without a match are emitted unchanged.
    pub fn keeps_unmatched_left(self) -> bool {
        matches!(self, JoinType::Left | JoinType::Outer)
    }

    /// Right entries no left item matched are appended at the end.
    pub fn emits_right_only(self) -> bool {
        matches!(self, JoinType::Right | JoinType::Outer)
    }
}

impl FromStr for JoinType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(JoinType::Left),
            "right" => Ok(JoinType::Right),
            "inner" => Ok(JoinType::Inner),
            "outer" | "full" => Ok(JoinType::Outer),
            other => Err(Error::Argument(format!("unknown join type '{other}'"))),
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Inner => "inner",
            JoinType::Outer => "outer",
        };
        f.write_str(name)
    }
}

/// Combine a matched left value with its right counterpart.
///
/// Records merge field-wise with right fields winning, lists concatenate,
/// and any other combination becomes the two-element list `[left, right]`.
pub fn merge_values(left: Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Record(mut l), Value::Record(r)) => {
            l.extend(r.iter().map(|(k, v)| (k.clone(), v.clone())));
            Value::Record(l)
        }
        (Value::List(mut l), Value::List(r)) => {
            l.extend(r.iter().cloned());
            Value::List(l)
        }
        (l, r) => Value::List(vec![l, r.clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_core::types::record;

    #[test]
    fn parses_names() {
        assert_eq!("Outer".parse::<JoinType>().expect("parse"), JoinType::Outer);
        assert_eq!("full".parse::<JoinType>().expect("parse"), JoinType::Outer);
        assert!("cross".parse::<JoinType>().is_err());
        assert_eq!(JoinType::Inner.to_string(), "inner");
    }

    #[test]
    fn merge_rules() {
        let l = Value::Record(record([("a", 1), ("b", 2)]));
        let r = Value::Record(record([("b", 3), ("c", 4)]));
        assert_eq!(
            merge_values(l, &r),
            Value::Record(record([("a", 1), ("b", 3), ("c", 4)]))
        );

        let l = Value::List(vec![1.into()]);
        let r = Value::List(vec![2.into(), 3.into()]);
        assert_eq!(
            merge_values(l, &r),
            Value::List(vec![1.into(), 2.into(), 3.into()])
        );

        assert_eq!(
            merge_values("a".into(), &"x".into()),
            Value::List(vec!["a".into(), "x".into()])
        );
    }
}
