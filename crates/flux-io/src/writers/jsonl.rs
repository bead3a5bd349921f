//! Streaming NDJSON sink.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flux_core::Result;
use serde::Serialize;

/// Writes one JSON document per line.
pub struct JsonlSink<W: Write> {
    writer: BufWriter<W>,
    written: u64,
}

impl JsonlSink<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> JsonlSink<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn write_item<T: Serialize>(&mut self, item: &T) -> Result<()> {
        let line = serde_json::to_string(item)?;
        writeln!(self.writer, "{}", line)?;
        self.written += 1;
        Ok(())
    }

    /// Drain `items`, stopping at the first error. Returns how many were written.
    pub fn write_all<T, I>(&mut self, items: I) -> Result<u64>
    where
        T: Serialize,
        I: IntoIterator<Item = Result<T>>,
    {
        let before = self.written;
        for item in items {
            self.write_item(&item?)?;
        }
        self.writer.flush()?;
        Ok(self.written - before)
    }

    /// Flush and hand back the inner writer.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_core::types::record;
    use flux_core::Value;
    use flux_operators::RecordsFlux;

    #[test]
    fn writes_one_object_per_line() {
        let records = RecordsFlux::from_records(vec![record([("a", 1)]), record([("a", 2)])]);
        let mut sink = JsonlSink::to_writer(Vec::new());
        assert_eq!(sink.write_all(records).expect("write"), 2);
        let out = String::from_utf8(sink.finish().expect("finish")).expect("utf8");
        assert_eq!(out, "{\"a\":1}\n{\"a\":2}\n");
    }

    #[test]
    fn stops_at_first_error() {
        let items: Vec<Result<Value>> = vec![
            Ok(Value::from(1)),
            Err(flux_core::Error::Validation("bad".into())),
            Ok(Value::from(3)),
        ];
        let mut sink = JsonlSink::to_writer(Vec::new());
        assert!(sink.write_all(items).is_err());
        assert_eq!(sink.written(), 1);
    }
}
