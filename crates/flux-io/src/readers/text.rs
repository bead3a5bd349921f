//! Line-oriented text sources.
//!
//! Files are read through a `BufReader` with an explicit capacity so the
//! in-flight bytes stay bounded no matter how long the file is. The line
//! ending (`"\n"` or `"\r\n"`) is stripped from each line.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use flux_core::{Error, FluxConfig, Result};
use flux_operators::variant::LinesMeta;
use flux_operators::{LinesFlux, Stream};
use serde::{Deserialize, Serialize};

/// Text encodings understood by the readers and the line sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
}

impl Encoding {
    pub fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes)
                .map_err(|e| Error::Validation(format!("invalid utf-8: {e}"))),
            Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c))
                        .map_err(|_| Error::Validation(format!("'{c}' is not latin-1")))
                })
                .collect(),
        }
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Encoding::Latin1),
            other => Err(Error::Argument(format!("unsupported encoding '{other}'"))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => f.write_str("utf-8"),
            Encoding::Latin1 => f.write_str("latin-1"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSourceOptions {
    pub encoding: Encoding,
    /// Known line count; skips the counting pass over the file.
    pub precount: Option<u64>,
    pub skip_first_line: bool,
    pub max_lines: Option<u64>,
    pub buffer_capacity: usize,
    /// Log progress every this many lines (0 disables).
    pub progress_step: u64,
}

impl Default for TextSourceOptions {
    fn default() -> Self {
        Self::from_config(&FluxConfig::default())
    }
}

impl TextSourceOptions {
    pub fn from_config(config: &FluxConfig) -> Self {
        Self {
            encoding: Encoding::Utf8,
            precount: None,
            skip_first_line: false,
            max_lines: None,
            buffer_capacity: config.read_buffer_bytes.max(1),
            progress_step: 100_000,
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_precount(mut self, count: u64) -> Self {
        self.precount = Some(count);
        self
    }

    pub fn skipping_first_line(mut self) -> Self {
        self.skip_first_line = true;
        self
    }

    pub fn with_max_lines(mut self, max_lines: u64) -> Self {
        self.max_lines = Some(max_lines);
        self
    }
}

struct LineReader<R> {
    reader: R,
    encoding: Encoding,
    limit: Option<u64>,
    read: u64,
    progress_step: u64,
    label: String,
    done: bool,
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Result<String>> {
        if self.done || self.limit.is_some_and(|limit| self.read >= limit) {
            return None;
        }
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                self.done = true;
                tracing::debug!(source = %self.label, lines = self.read, "text source exhausted");
                None
            }
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                self.read += 1;
                if self.progress_step > 0 && self.read % self.progress_step == 0 {
                    tracing::debug!(source = %self.label, lines = self.read, "reading");
                }
                Some(self.encoding.decode(buf))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

/// Number of lines the text reader will yield for `path`: one per `'\n'`,
/// plus one for a final unterminated line.
pub fn count_lines(path: impl AsRef<Path>) -> Result<u64> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    let mut buf = [0u8; 64 * 1024];
    let mut newlines = 0u64;
    let mut last = None;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        newlines += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
        last = Some(buf[n - 1]);
    }
    Ok(match last {
        Some(b) if b != b'\n' => newlines + 1,
        _ => newlines,
    })
}

/// Open `path` as a lazy stream of lines tagged with its source path.
///
/// The expected count is `precount` when given, otherwise the result of a
/// counting pass; it is capped by `max_lines` and reduced by one when the
/// first line is skipped.
pub fn from_text_source(path: impl AsRef<Path>, options: &TextSourceOptions) -> Result<LinesFlux> {
    let path = path.as_ref();
    let counted = match options.precount {
        Some(count) => count,
        None => count_lines(path)?,
    };
    let count = options.max_lines.map_or(counted, |max| counted.min(max));

    let file = File::open(path)?;
    let lines = LineReader {
        reader: BufReader::with_capacity(options.buffer_capacity.max(1), file),
        encoding: options.encoding,
        limit: Some(count),
        read: 0,
        progress_step: options.progress_step,
        label: path.display().to_string(),
        done: false,
    };
    tracing::debug!(source = %path.display(), count, encoding = %options.encoding, "text source opened");

    let meta = LinesMeta::default().with_source(PathBuf::from(path));
    let flux = LinesFlux::from_string_stream(Stream::from_results(lines, Some(count)), meta);
    Ok(if options.skip_first_line {
        flux.skip(1)
    } else {
        flux
    })
}

/// Lines from any buffered reader. `precount` is taken as the expected count
/// but does not limit reading.
pub fn from_reader<R>(reader: R, encoding: Encoding, precount: Option<u64>) -> LinesFlux
where
    R: BufRead + 'static,
{
    let lines = LineReader {
        reader,
        encoding,
        limit: None,
        read: 0,
        progress_step: 0,
        label: "<reader>".to_string(),
        done: false,
    };
    LinesFlux::from_string_stream(Stream::from_results(lines, precount), LinesMeta::default())
}
