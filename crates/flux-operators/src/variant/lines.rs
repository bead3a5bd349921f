//! Text lines, typically read from a file.

use std::path::{Path, PathBuf};

use flux_core::{Error, Result, Value};

use super::{
    CheckMode, Fluxed, PairsFlux, PairsMeta, RecordsFlux, RecordsMeta, RowsFlux, RowsMeta,
    Variant, VariantMeta,
};
use crate::stream::Stream;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinesMeta {
    pub check: CheckMode,
    /// File the lines were read from, if any.
    pub source: Option<PathBuf>,
}

impl LinesMeta {
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }
}

impl VariantMeta for LinesMeta {
    const VARIANT: Variant = Variant::Lines;

    fn check(&self) -> CheckMode {
        self.check
    }

    fn with_check(mut self, check: CheckMode) -> Self {
        self.check = check;
        self
    }

    fn is_valid_item(&self, item: &Value) -> bool {
        matches!(item, Value::Str(_))
    }
}

pub type LinesFlux = Fluxed<LinesMeta>;

fn line_text(item: Value) -> Result<String> {
    match item {
        Value::Str(s) => Ok(s),
        other => Err(Error::Validation(format!("not a line: {other}"))),
    }
}

/// Parse one line as a single CSV record.
pub(crate) fn parse_delimited(line: &str, delimiter: u8) -> Result<Vec<Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(Value::from).collect()),
        Ok(false) => Ok(Vec::new()),
        Err(e) => Err(Error::Validation(format!("csv: {e}"))),
    }
}

impl LinesFlux {
    pub fn from_strings(lines: Vec<String>) -> Self {
        let items = lines.into_iter().map(Value::Str).collect();
        Self::from_parts(Stream::from_vec(items), LinesMeta::default())
    }

    pub fn from_string_stream(lines: Stream<String>, meta: LinesMeta) -> Self {
        Self::from_parts(lines.map(Value::Str), meta)
    }

    pub fn source(&self) -> Option<&Path> {
        self.meta().source.as_deref()
    }

    pub fn into_strings(self) -> Stream<String> {
        self.into_stream().try_map(line_text)
    }

    /// Decode every line as JSON. Undecodable lines become `default` when one
    /// is given; decoded values that are not objects fail the strict check.
    pub fn parse_json(self, default: Option<Value>) -> RecordsFlux {
        let stream = self.into_stream().try_map(move |item| {
            let text = line_text(item)?;
            match (serde_json::from_str::<Value>(&text), &default) {
                (Ok(value), _) => Ok(value),
                (Err(_), Some(fallback)) => Ok(fallback.clone()),
                (Err(e), None) => Err(e.into()),
            }
        });
        RecordsFlux::new(stream, RecordsMeta::default())
    }

    /// Split each line into cells.
    pub fn to_rows(self, delimiter: u8) -> RowsFlux {
        let stream = self
            .into_stream()
            .try_map(move |item| Ok(Value::List(parse_delimited(&line_text(item)?, delimiter)?)));
        RowsFlux::from_parts(stream, RowsMeta::default())
    }

    /// Two-cell lines as `(key, value)` pairs.
    pub fn to_pairs(self, delimiter: u8) -> PairsFlux {
        let (stream, _) = self.to_rows(delimiter).into_parts();
        PairsFlux::new(stream, PairsMeta::default())
    }
}
