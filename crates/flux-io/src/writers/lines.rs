//! Line sink: one item per line, in display form.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flux_core::Result;
use flux_operators::{LinesFlux, Stream};

use crate::readers::{from_text_source, Encoding, TextSourceOptions};

/// Writes items to `path`, each followed by `terminator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSink {
    pub path: PathBuf,
    pub terminator: String,
    pub encoding: Encoding,
}

fn write_line<W: Write, T: fmt::Display>(
    out: &mut W,
    item: &T,
    encoding: Encoding,
    terminator: &[u8],
) -> Result<()> {
    out.write_all(&encoding.encode(&item.to_string())?)?;
    out.write_all(terminator)?;
    Ok(())
}

impl LineSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            terminator: "\n".to_string(),
            encoding: Encoding::Utf8,
        }
    }

    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create(&self) -> Result<BufWriter<File>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(BufWriter::new(File::create(&self.path)?))
    }

    /// Drain `items` into the file. Returns the number of items written.
    pub fn write<I, T>(&self, items: I) -> Result<u64>
    where
        I: IntoIterator<Item = Result<T>>,
        T: fmt::Display,
    {
        let terminator = self.encoding.encode(&self.terminator)?;
        let mut out = self.create()?;
        let mut written = 0u64;
        for item in items {
            write_line(&mut out, &item?, self.encoding, &terminator)?;
            written += 1;
        }
        out.flush()?;
        tracing::debug!(path = %self.path.display(), written, "lines written");
        Ok(written)
    }

    /// Write, then reopen the file as lines with the written count. Items are
    /// read back one per `'\n'`, so a round trip is exact with the default
    /// terminator and items without embedded newlines.
    pub fn write_and_reopen<I, T>(&self, items: I) -> Result<LinesFlux>
    where
        I: IntoIterator<Item = Result<T>>,
        T: fmt::Display,
    {
        let written = self.write(items)?;
        let options = TextSourceOptions::default()
            .with_encoding(self.encoding)
            .with_precount(written);
        from_text_source(&self.path, &options)
    }

    /// Write items through to the file as the returned stream is pulled.
    /// The file is flushed once the stream is exhausted.
    pub fn save<T>(&self, stream: Stream<T>) -> Result<Stream<T>>
    where
        T: fmt::Display + 'static,
    {
        let count = stream.expected_count();
        let terminator = self.encoding.encode(&self.terminator)?;
        let encoding = self.encoding;
        let path = self.path.clone();
        let mut writer = Some(self.create()?);
        let mut items = stream;
        let mut written = 0u64;

        let through = std::iter::from_fn(move || {
            let out = writer.as_mut()?;
            match items.next() {
                Some(Ok(item)) => match write_line(out, &item, encoding, &terminator) {
                    Ok(()) => {
                        written += 1;
                        Some(Ok(item))
                    }
                    Err(e) => {
                        writer = None;
                        Some(Err(e))
                    }
                },
                Some(Err(e)) => Some(Err(e)),
                None => {
                    let mut out = writer.take()?;
                    tracing::debug!(path = %path.display(), written, "save finished");
                    out.flush().err().map(|e| Err(e.into()))
                }
            }
        });
        Ok(Stream::from_results(through, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_core::Value;
    use flux_operators::AnyFlux;
    use tempfile::tempdir;

    #[test]
    fn terminator_follows_every_item() {
        let dir = tempdir().expect("tempdir");
        let sink = LineSink::new(dir.path().join("out.txt")).with_terminator(";\n");
        let n = sink
            .write(AnyFlux::from_values(vec!["a".into(), Value::from(2)]))
            .expect("write");
        assert_eq!(n, 2);
        let text = fs::read_to_string(sink.path()).expect("read");
        assert_eq!(text, "a;\n2;\n");
    }

    #[test]
    fn write_and_reopen_round_trip() {
        let dir = tempdir().expect("tempdir");
        let sink = LineSink::new(dir.path().join("nested").join("lines.txt"));
        let lines = vec!["x".to_string(), "".to_string(), "z".to_string()];
        let reopened = sink
            .write_and_reopen(LinesFlux::from_strings(lines.clone()))
            .expect("round trip");
        assert_eq!(reopened.expected_count(), Some(3));
        assert_eq!(reopened.source(), Some(sink.path()));
        assert_eq!(reopened.into_strings().collect_vec().expect("read"), lines);
    }

    #[test]
    fn save_is_lazy_write_through() {
        let dir = tempdir().expect("tempdir");
        let sink = LineSink::new(dir.path().join("saved.txt"));
        let saved = sink
            .save(Stream::lazy(vec![1i64, 2, 3], Some(3)))
            .expect("save");
        assert_eq!(saved.expected_count(), Some(3));
        assert_eq!(fs::read_to_string(sink.path()).expect("read"), "");
        assert_eq!(saved.collect_vec().expect("items"), vec![1, 2, 3]);
        assert_eq!(fs::read_to_string(sink.path()).expect("read"), "1\n2\n3\n");
    }

    #[test]
    fn latin1_output() {
        let dir = tempdir().expect("tempdir");
        let sink = LineSink::new(dir.path().join("latin.txt")).with_encoding(Encoding::Latin1);
        sink.write(vec![Ok::<_, flux_core::Error>("é")]).expect("write");
        assert_eq!(fs::read(sink.path()).expect("read"), vec![0xE9, b'\n']);
        assert!(sink.write(vec![Ok::<_, flux_core::Error>("€")]).is_err());
    }
}
