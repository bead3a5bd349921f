//! Pipeline configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default spill threshold and chunk size (items, not bytes).
pub const DEFAULT_MAX_ITEMS_IN_MEMORY: u64 = 5_000_000;

/// Placeholder replaced by the chunk index (or `total`) in chunk file names.
pub const CHUNK_PLACEHOLDER: &str = "{}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluxConfig {
    /// Streams whose known count exceeds this (or whose count is unknown) are
    /// sorted on disk. `None` disables spilling entirely.
    pub max_items_in_memory: Option<u64>,

    /// Items per sorted run written during an external sort.
    pub chunk_items: usize,

    /// Directory under which each sort creates its own spill session.
    pub spill_dir: String,

    /// Chunk file name template; `{}` becomes the chunk index or `total`.
    pub chunk_template: String,

    /// Buffer size used when reading text sources and chunk files.
    pub read_buffer_bytes: usize,
}

impl Default for FluxConfig {
    fn default() -> Self {
        Self {
            max_items_in_memory: Some(DEFAULT_MAX_ITEMS_IN_MEMORY),
            chunk_items: DEFAULT_MAX_ITEMS_IN_MEMORY as usize,
            spill_dir: std::env::temp_dir()
                .join("flux-spill")
                .to_string_lossy()
                .into_owned(),
            chunk_template: "merge_sort_{}.tmp".to_string(),
            read_buffer_bytes: 64 * 1024,
        }
    }
}

impl FluxConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `FLUX_MAX_ITEMS_IN_MEMORY`: spill threshold in items (`none` disables spilling)
    /// - `FLUX_CHUNK_ITEMS`: items per sorted run
    /// - `FLUX_SPILL_DIR`: spill root directory
    /// - `FLUX_CHUNK_TEMPLATE`: chunk file name template
    /// - `FLUX_READ_BUFFER_BYTES`: read buffer size
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("FLUX_MAX_ITEMS_IN_MEMORY") {
            if s.trim().eq_ignore_ascii_case("none") {
                cfg.max_items_in_memory = None;
            } else if let Ok(v) = s.trim().parse::<u64>() {
                cfg.max_items_in_memory = Some(v);
            }
        }

        if let Ok(s) = std::env::var("FLUX_CHUNK_ITEMS") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.chunk_items = v;
            }
        }

        if let Ok(s) = std::env::var("FLUX_SPILL_DIR") {
            cfg.spill_dir = s;
        }

        if let Ok(s) = std::env::var("FLUX_CHUNK_TEMPLATE") {
            cfg.chunk_template = s;
        }

        if let Ok(s) = std::env::var("FLUX_READ_BUFFER_BYTES") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.read_buffer_bytes = v;
            }
        }

        cfg
    }

    pub fn with_max_items_in_memory(mut self, max_items: Option<u64>) -> Self {
        self.max_items_in_memory = max_items;
        self
    }

    pub fn with_chunk_items(mut self, chunk_items: usize) -> Self {
        self.chunk_items = chunk_items;
        self
    }

    pub fn with_spill_dir(mut self, spill_dir: impl Into<String>) -> Self {
        self.spill_dir = spill_dir.into();
        self
    }

    pub fn with_chunk_template(mut self, template: impl Into<String>) -> Self {
        self.chunk_template = template.into();
        self
    }

    /// Reject settings that would make an external sort loop or collide.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_items == 0 {
            return Err(Error::Config("chunk_items must be at least 1".into()));
        }
        if !self.chunk_template.contains(CHUNK_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "chunk_template '{}' has no '{}' placeholder",
                self.chunk_template, CHUNK_PLACEHOLDER
            )));
        }
        if self.read_buffer_bytes == 0 {
            return Err(Error::Config("read_buffer_bytes must be positive".into()));
        }
        Ok(())
    }

    /// Whether a stream with this many known items must go to disk.
    pub fn exceeds_memory(&self, count: Option<u64>) -> bool {
        match (self.max_items_in_memory, count) {
            (None, _) => false,
            (Some(limit), Some(n)) => n > limit,
            (Some(_), None) => true,
        }
    }
}
