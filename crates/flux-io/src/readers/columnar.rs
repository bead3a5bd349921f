//! Columnar batches as record streams.

use flux_core::{ColumnBatch, Result, Value};
use flux_operators::variant::RecordsMeta;
use flux_operators::{RecordsFlux, Stream};

/// One record per batch row, in row order. Ragged batches are rejected.
pub fn from_columnar_source(batch: ColumnBatch) -> Result<RecordsFlux> {
    batch.validate()?;
    let rows = batch.num_rows();
    tracing::debug!(rows, columns = batch.columns.len(), "columnar source opened");
    let records = (0..rows).map(move |i| Value::Record(batch.row_record(i)));
    Ok(RecordsFlux::from_parts(
        Stream::lazy(records, Some(rows as u64)),
        RecordsMeta::default(),
    ))
}
