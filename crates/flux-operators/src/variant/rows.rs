//! Rows: lists of cells.

use flux_core::schema::{CastMode, Schema};
use flux_core::{Error, Record, Result, Value};

use super::schema::schematize_stream;
use super::{CheckMode, Fluxed, RecordsFlux, RecordsMeta, SchemaFlux, Variant, VariantMeta};
use crate::select::{project_row, Selector};
use crate::stream::Stream;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowsMeta {
    pub check: CheckMode,
}

impl VariantMeta for RowsMeta {
    const VARIANT: Variant = Variant::Rows;

    fn check(&self) -> CheckMode {
        self.check
    }

    fn with_check(mut self, check: CheckMode) -> Self {
        self.check = check;
        self
    }

    fn is_valid_item(&self, item: &Value) -> bool {
        matches!(item, Value::List(_))
    }
}

pub type RowsFlux = Fluxed<RowsMeta>;

pub(crate) fn row_cells(item: Value) -> Result<Vec<Value>> {
    match item {
        Value::List(cells) => Ok(cells),
        other => Err(Error::Validation(format!("not a row: {other}"))),
    }
}

impl RowsFlux {
    pub fn from_rows(rows: Vec<Vec<Value>>) -> Self {
        let items = rows.into_iter().map(Value::List).collect();
        Self::from_parts(Stream::from_vec(items), RowsMeta::default())
    }

    /// Project every row through `selectors`. A selector pointing past the
    /// end of a row fails with an argument error when that row is pulled.
    pub fn select(self, selectors: Vec<Selector>) -> RowsFlux {
        let (stream, meta) = self.into_parts();
        let stream = stream.try_map(move |item| {
            let cells = row_cells(item)?;
            Ok(Value::List(project_row(&selectors, &cells)?))
        });
        RowsFlux::from_parts(stream, meta)
    }

    /// Name the cells. Without columns each row becomes `{"row": [...]}`;
    /// otherwise cells and names are zipped and extras on either side dropped.
    pub fn to_records(self, columns: &[&str]) -> RecordsFlux {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let stream = self.into_stream().try_map(move |item| {
            if columns.is_empty() {
                let mut record = Record::new();
                record.insert("row".to_string(), item);
                return Ok(Value::Record(record));
            }
            let cells = row_cells(item)?;
            let record: Record = columns.iter().cloned().zip(cells).collect();
            Ok(Value::Record(record))
        });
        RecordsFlux::from_parts(stream, RecordsMeta::default())
    }

    pub fn schematize(self, schema: Schema, mode: CastMode) -> SchemaFlux {
        schematize_stream(self.into_stream(), schema, mode)
    }
}
