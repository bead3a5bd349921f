//! Spill manager for external-memory operators.
//!
//! Orchestrates writing/reading chunk files inside one spill session.

pub mod chunk;

use std::sync::Arc;

use flux_core::config::{FluxConfig, CHUNK_PLACEHOLDER};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::guard::{ChunkFile, SpillSession};

pub use chunk::{ChunkLabel, ChunkMeta, ChunkReader, ChunkWriter};

/// Central manager for spilling sorted runs to local disk.
///
/// Responsibilities:
/// - Name chunk files from the configured template
/// - Serialize items as JSON lines with checksums
/// - Hand out readers that keep their chunk alive
pub struct SpillManager {
    session: Arc<SpillSession>,
    template: String,
    buffer_bytes: usize,
    next_run: u32,
}

impl SpillManager {
    /// Open a fresh session under `config.spill_dir`.
    pub fn new(config: &FluxConfig) -> Result<Self> {
        if !config.chunk_template.contains(CHUNK_PLACEHOLDER) {
            return Err(Error::Template(format!(
                "'{}' has no '{}' placeholder",
                config.chunk_template, CHUNK_PLACEHOLDER
            )));
        }
        let session = SpillSession::create(&config.spill_dir)?;
        Ok(Self {
            session,
            template: config.chunk_template.clone(),
            buffer_bytes: config.read_buffer_bytes.max(1),
            next_run: 0,
        })
    }

    pub fn session(&self) -> &Arc<SpillSession> {
        &self.session
    }

    /// Generate the next run index for this spill session.
    pub fn next_run_index(&mut self) -> u32 {
        let idx = self.next_run;
        self.next_run += 1;
        idx
    }

    /// File name for a chunk, e.g. `merge_sort_3.tmp` or `merge_sort_total.tmp`.
    pub fn chunk_name(&self, label: ChunkLabel) -> String {
        self.template.replace(CHUNK_PLACEHOLDER, &label.to_string())
    }

    /// Start a streaming chunk write.
    pub fn create_chunk(&self, label: ChunkLabel) -> Result<ChunkWriter> {
        let path = self.session.dir().join(self.chunk_name(label));
        let file = ChunkFile::new(path, Arc::clone(&self.session));
        ChunkWriter::new(label, file, self.buffer_bytes)
    }

    /// Write an already-sorted slice as the next run.
    pub fn write_run<T: Serialize>(&mut self, items: &[T]) -> Result<ChunkMeta> {
        let label = ChunkLabel::Run(self.next_run_index());
        let mut writer = self.create_chunk(label)?;
        for item in items {
            writer.push(item)?;
        }
        writer.finish()
    }

    /// Open a chunk for sequential reading.
    pub fn open_chunk<T: DeserializeOwned>(&self, meta: &ChunkMeta) -> Result<ChunkReader<T>> {
        ChunkReader::open(meta, self.buffer_bytes)
    }
}
