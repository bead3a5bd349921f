//! Small item helpers meant to be passed to `map`.

use std::collections::BTreeMap;

use flux_core::{Error, Record, Result, Value};

use crate::variant::lines::parse_delimited;

/// Cells of one CSV line.
pub fn split_csv_row(line: &str, delimiter: u8) -> Result<Vec<Value>> {
    parse_delimited(line, delimiter)
}

/// Replace `record[field]` by its entry in `mapping`. Unmapped values become
/// `default`, or stay as they are when there is none. A missing field reads
/// as null.
pub fn apply_dict_to_field(
    mut record: Record,
    field: &str,
    mapping: &BTreeMap<Value, Value>,
    default: Option<&Value>,
) -> Record {
    let current = record.get(field).cloned().unwrap_or(Value::Null);
    let replaced = match (mapping.get(&current), default) {
        (Some(mapped), _) => mapped.clone(),
        (None, Some(fallback)) => fallback.clone(),
        (None, None) => current,
    };
    record.insert(field.to_string(), replaced);
    record
}

/// Set every field of `additional`, overriding existing ones.
pub fn add_fields(mut record: Record, additional: &Record) -> Record {
    record.extend(additional.iter().map(|(k, v)| (k.clone(), v.clone())));
    record
}

/// Shorten cells whose text is longer than `max_len` characters to
/// `max_len`, ending in `substitute`. With `str_only`, non-string cells are
/// left alone; otherwise they are cropped as text.
pub fn crop_cells(
    row: Vec<Value>,
    max_len: usize,
    substitute: &str,
    str_only: bool,
) -> Result<Vec<Value>> {
    let keep = max_len
        .checked_sub(substitute.chars().count())
        .filter(|&keep| keep > 0)
        .ok_or_else(|| {
            Error::Argument(format!(
                "max_len {max_len} leaves no room beside substitute '{substitute}'"
            ))
        })?;
    Ok(row
        .into_iter()
        .map(|cell| {
            if str_only && !matches!(cell, Value::Str(_)) {
                return cell;
            }
            let text = cell.to_string();
            if text.chars().count() <= max_len {
                return cell;
            }
            let mut cropped: String = text.chars().take(keep).collect();
            cropped.push_str(substitute);
            Value::Str(cropped)
        })
        .collect())
}

/// Merge each group of duplicate fields into its first field: the first
/// non-null value in the group wins and the other fields are removed.
/// Groups with no value are left untouched.
pub fn union_duplicate_fields(mut record: Record, groups: &[&[&str]]) -> Record {
    for group in groups {
        let Some((main, rest)) = group.split_first() else {
            continue;
        };
        let found = group
            .iter()
            .filter_map(|field| record.get(*field))
            .find(|v| !v.is_null())
            .cloned();
        if let Some(value) = found {
            record.insert(main.to_string(), value);
            for field in rest {
                record.remove(*field);
            }
        }
    }
    record
}
