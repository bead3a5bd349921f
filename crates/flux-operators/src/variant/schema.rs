//! Rows bound to a schema.

use flux_core::schema::{CastMode, Schema};
use flux_core::{Record, Value};

use super::{CheckMode, Fluxed, RecordsFlux, RecordsMeta, Variant, VariantMeta};
use crate::stream::Stream;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMeta {
    pub check: CheckMode,
    pub schema: Schema,
}

impl SchemaMeta {
    pub fn new(schema: Schema) -> Self {
        Self {
            check: CheckMode::default(),
            schema,
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }
}

impl VariantMeta for SchemaMeta {
    const VARIANT: Variant = Variant::Schema;

    fn check(&self) -> CheckMode {
        self.check
    }

    fn with_check(mut self, check: CheckMode) -> Self {
        self.check = check;
        self
    }

    /// Rows must match the schema's arity.
    fn is_valid_item(&self, item: &Value) -> bool {
        self.schema.fits(item)
    }
}

pub type SchemaFlux = Fluxed<SchemaMeta>;

/// Cast every row of `rows` with `schema`. Row counts survive unless
/// `SkipBadRows` may drop rows.
pub(crate) fn schematize_stream(rows: Stream<Value>, schema: Schema, mode: CastMode) -> SchemaFlux {
    let count = if mode.drops_rows() {
        None
    } else {
        rows.expected_count()
    };
    let caster = schema.clone();
    let cast = rows.into_items().filter_map(move |item| {
        match item.and_then(|row| caster.cast_row(row, mode)) {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    });
    SchemaFlux::from_parts(Stream::from_results(cast, count), SchemaMeta::new(schema))
}

impl SchemaFlux {
    pub fn schema(&self) -> &Schema {
        &self.meta().schema
    }

    /// Rebind to `schema` without casting; rows are re-checked under `check`.
    pub fn set_schema(self, schema: Schema, check: CheckMode) -> SchemaFlux {
        let (stream, meta) = self.into_parts();
        SchemaFlux::new(stream, meta.with_schema(schema).with_check(check))
    }

    pub fn schematize(self, schema: Schema, mode: CastMode) -> SchemaFlux {
        schematize_stream(self.into_stream(), schema, mode)
    }

    /// Name the cells by the schema's field names.
    pub fn to_records(self) -> RecordsFlux {
        let names: Vec<String> = self.schema().names().iter().map(|n| n.to_string()).collect();
        let stream = self.into_stream().map(move |item| {
            let record: Record = match item {
                Value::List(cells) => names.iter().cloned().zip(cells).collect(),
                other => names.iter().cloned().zip(std::iter::once(other)).collect(),
            };
            Value::Record(record)
        });
        RecordsFlux::from_parts(stream, RecordsMeta::default())
    }
}
