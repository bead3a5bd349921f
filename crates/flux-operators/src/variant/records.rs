//! Records: string-keyed maps of values.

use flux_core::schema::{CastMode, Schema};
use flux_core::{Error, FluxConfig, Record, Result, Value};

use super::schema::schematize_stream;
use super::{
    CheckMode, Fluxed, LinesFlux, LinesMeta, PairsFlux, PairsMeta, RowsFlux, RowsMeta, SchemaFlux,
    Variant, VariantMeta,
};
use crate::join::{map_side_join, merge_values, JoinType};
use crate::select::RecordSelect;
use crate::stream::Stream;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordsMeta {
    pub check: CheckMode,
}

impl VariantMeta for RecordsMeta {
    const VARIANT: Variant = Variant::Records;

    fn check(&self) -> CheckMode {
        self.check
    }

    fn with_check(mut self, check: CheckMode) -> Self {
        self.check = check;
        self
    }

    fn is_valid_item(&self, item: &Value) -> bool {
        matches!(item, Value::Record(_))
    }
}

pub type RecordsFlux = Fluxed<RecordsMeta>;

fn into_record(item: Value) -> Result<Record> {
    match item {
        Value::Record(r) => Ok(r),
        other => Err(Error::Validation(format!("not a record: {other}"))),
    }
}

/// One field as the key, or a list of fields for composite keys.
fn key_of(item: &Value, fields: &[String]) -> Value {
    match fields {
        [single] => item.field(single),
        _ => Value::List(fields.iter().map(|f| item.field(f)).collect()),
    }
}

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(v) => v.to_string(),
    }
}

impl RecordsFlux {
    pub fn from_records(records: Vec<Record>) -> Self {
        let items = records.into_iter().map(Value::Record).collect();
        Self::from_parts(Stream::from_vec(items), RecordsMeta::default())
    }

    pub fn into_record_stream(self) -> Stream<Record> {
        self.into_stream().try_map(into_record)
    }

    /// Project every record. Cycles among computed fields are rejected here,
    /// before any item is pulled.
    pub fn select(self, select: RecordSelect) -> Result<RecordsFlux> {
        let projection = select.plan()?;
        let (stream, meta) = self.into_parts();
        let stream = stream.try_map(move |item| {
            let record = into_record(item)?;
            Ok(Value::Record(projection.apply(&record)))
        });
        Ok(RecordsFlux::from_parts(stream, meta))
    }

    pub fn sort_by_fields(
        self,
        fields: &[&str],
        reverse: bool,
        config: &FluxConfig,
    ) -> Result<RecordsFlux> {
        let fields = owned(fields);
        self.sort_by(
            move |item| fields.iter().map(|f| item.field(f)).collect::<Vec<_>>(),
            reverse,
            config,
        )
    }

    /// Group records sharing the key fields into `(key, [records...])` pairs.
    /// Composite keys are lists of the field values.
    pub fn group_by(self, keys: &[&str], config: &FluxConfig) -> Result<PairsFlux> {
        let keys = owned(keys);
        let key = move |item: &Value| key_of(item, &keys);
        let groups = self
            .into_stream()
            .group_by(key, |item| item, config)?
            .map(|(k, records)| (k, Value::List(records)));
        Ok(PairsFlux::from_pair_stream(
            groups,
            PairsMeta::default().with_secondary(Variant::Rows),
        ))
    }

    /// Join on the `on` fields; matched records are merged with right fields
    /// winning.
    pub fn map_side_join(
        self,
        right: RecordsFlux,
        on: &[&str],
        how: JoinType,
    ) -> Result<RecordsFlux> {
        let on = owned(on);
        let right_on = on.clone();
        let (left, meta) = self.into_parts();
        let left = left.map(move |item| (key_of(&item, &on), item));
        let right = right
            .into_stream()
            .into_items()
            .map(move |r| r.map(|item| (key_of(&item, &right_on), item)));
        let joined = map_side_join(left, right, how, merge_values)?;
        Ok(RecordsFlux::from_parts(joined.map(|(_, item)| item), meta))
    }

    /// Cells in `columns` order; missing fields are null.
    pub fn to_rows(self, columns: &[&str], add_title_row: bool) -> RowsFlux {
        let columns = owned(columns);
        let title = Value::List(columns.iter().map(|c| Value::from(c.as_str())).collect());
        let rows = self.into_stream().map(move |item| {
            Value::List(columns.iter().map(|c| item.field(c)).collect())
        });
        let rows = if add_title_row {
            rows.add(Stream::from_vec(vec![title]), true)
        } else {
            rows
        };
        RowsFlux::from_parts(rows, RowsMeta::default())
    }

    /// Delimiter-joined text of the `columns`, e.g. TSV lines.
    pub fn to_delimited_lines(
        self,
        columns: &[&str],
        add_title_row: bool,
        delimiter: &str,
    ) -> LinesFlux {
        let columns = owned(columns);
        let delimiter = delimiter.to_string();
        let title = columns.join(&delimiter);
        let lines = self.into_stream().map(move |item| {
            let record = item.as_record();
            let cells: Vec<String> = columns
                .iter()
                .map(|c| cell_text(record.and_then(|r| r.get(c))))
                .collect();
            Value::Str(cells.join(&delimiter))
        });
        let lines = if add_title_row {
            lines.add(Stream::from_vec(vec![Value::Str(title)]), true)
        } else {
            lines
        };
        LinesFlux::from_parts(lines, LinesMeta::default())
    }

    pub fn to_pairs(self, key_field: &str, value_field: &str) -> PairsFlux {
        let key_field = key_field.to_string();
        let value_field = value_field.to_string();
        let pairs = self
            .into_stream()
            .map(move |item| (item.field(&key_field), item.field(&value_field)));
        PairsFlux::from_pair_stream(pairs, PairsMeta::default())
    }

    /// Cast the schema's fields, in schema order, into typed rows.
    pub fn schematize(self, schema: Schema, mode: CastMode) -> SchemaFlux {
        let names = owned(&schema.names());
        let rows = self
            .into_stream()
            .map(move |item| Value::List(names.iter().map(|n| item.field(n)).collect()));
        schematize_stream(rows, schema, mode)
    }
}
