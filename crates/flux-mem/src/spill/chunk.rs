//! Chunk files: newline-delimited JSON, one item per line.
//!
//! A blake3 checksum over the exact bytes written is kept in `ChunkMeta`; the
//! reader hashes while it streams and verifies once it reaches end-of-file.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::guard::ChunkFile;

/// What a chunk file name is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkLabel {
    /// A sorted run.
    Run(u32),
    /// The full-input dump written to discover an unknown count.
    Total,
}

impl fmt::Display for ChunkLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkLabel::Run(i) => write!(f, "{i}"),
            ChunkLabel::Total => f.write_str("total"),
        }
    }
}

/// Metadata for a finished chunk. Cloning shares the underlying file, which
/// is deleted when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct ChunkMeta {
    pub label: ChunkLabel,
    pub items: u64,
    pub bytes: u64,
    pub checksum: [u8; 32],
    file: Arc<ChunkFile>,
}

impl ChunkMeta {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Streaming writer for one chunk.
pub struct ChunkWriter {
    label: ChunkLabel,
    writer: BufWriter<File>,
    hasher: blake3::Hasher,
    items: u64,
    bytes: u64,
    line: Vec<u8>,
    file: Arc<ChunkFile>,
}

impl ChunkWriter {
    pub(crate) fn new(label: ChunkLabel, file: Arc<ChunkFile>, capacity: usize) -> Result<Self> {
        let handle = File::create(file.path())?;
        Ok(Self {
            label,
            writer: BufWriter::with_capacity(capacity, handle),
            hasher: blake3::Hasher::new(),
            items: 0,
            bytes: 0,
            line: Vec::new(),
            file,
        })
    }

    /// Append one item as a JSON line.
    pub fn push<T: Serialize>(&mut self, item: &T) -> Result<()> {
        self.line.clear();
        serde_json::to_writer(&mut self.line, item)
            .map_err(|e| Error::Codec(format!("json serialize: {e}")))?;
        self.line.push(b'\n');
        self.hasher.update(&self.line);
        self.writer.write_all(&self.line)?;
        self.items += 1;
        self.bytes += self.line.len() as u64;
        Ok(())
    }

    pub fn items(&self) -> u64 {
        self.items
    }

    /// Flush and seal the chunk.
    pub fn finish(mut self) -> Result<ChunkMeta> {
        self.writer.flush()?;
        tracing::trace!(
            chunk = %self.label,
            items = self.items,
            bytes = self.bytes,
            "chunk sealed"
        );
        Ok(ChunkMeta {
            label: self.label,
            items: self.items,
            bytes: self.bytes,
            checksum: self.hasher.finalize().into(),
            file: self.file,
        })
    }
}

/// Re-readable view over a sealed chunk. Yields one deserialized item per line.
pub struct ChunkReader<T> {
    meta: ChunkMeta,
    reader: BufReader<File>,
    hasher: blake3::Hasher,
    line: Vec<u8>,
    read: u64,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ChunkReader<T> {
    pub(crate) fn open(meta: &ChunkMeta, capacity: usize) -> Result<Self> {
        let handle = File::open(meta.path())?;
        tracing::trace!(chunk = %meta.label, items = meta.items, "chunk opened");
        Ok(Self {
            meta: meta.clone(),
            reader: BufReader::with_capacity(capacity, handle),
            hasher: blake3::Hasher::new(),
            line: Vec::new(),
            read: 0,
            done: false,
            _marker: PhantomData,
        })
    }

    pub fn meta(&self) -> &ChunkMeta {
        &self.meta
    }

    fn verify(&self) -> Result<()> {
        let computed: [u8; 32] = self.hasher.finalize().into();
        if computed != self.meta.checksum {
            return Err(Error::ChecksumMismatch(self.meta.label.to_string()));
        }
        if self.read != self.meta.items {
            return Err(Error::Storage(format!(
                "chunk '{}' yielded {} items, expected {}",
                self.meta.label, self.read, self.meta.items
            )));
        }
        Ok(())
    }
}

impl<T: DeserializeOwned> Iterator for ChunkReader<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.line.clear();
        match self.reader.read_until(b'\n', &mut self.line) {
            Ok(0) => {
                self.done = true;
                match self.verify() {
                    Ok(()) => None,
                    Err(e) => Some(Err(e)),
                }
            }
            Ok(_) => {
                self.hasher.update(&self.line);
                self.read += 1;
                let body = self.line.strip_suffix(b"\n").unwrap_or(&self.line);
                Some(
                    serde_json::from_slice(body)
                        .map_err(|e| Error::Codec(format!("json deserialize: {e}"))),
                )
            }
            Err(e) => {
                self.done = true;
                Some(Err(Error::Io(e)))
            }
        }
    }
}
