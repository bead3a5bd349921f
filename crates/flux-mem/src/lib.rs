#![forbid(unsafe_code)]
//! flux-mem: spill storage for external-memory operators.
//!
//! Sorted runs are written as newline-delimited JSON chunk files inside a
//! per-sort session directory. Every file and directory is owned by an RAII
//! guard, so abandoning a pipeline half-way still cleans the disk.

pub mod error;
pub mod guard;
pub mod spill;

pub use error::{Error, Result};
pub use guard::{ChunkFile, SpillSession};
pub use spill::{ChunkLabel, ChunkMeta, ChunkReader, ChunkWriter, SpillManager};
