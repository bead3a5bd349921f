//! RAII owners for spill files and session directories.
//!
//! Chunk files hold an `Arc` to their session, so the session directory is
//! removed only after the last chunk (and the last reader over it) is gone.
//! Drop never fails; cleanup problems are logged.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flux_core::id::SpillId;

use crate::error::Result;

/// One sort's private spill directory.
#[derive(Debug)]
pub struct SpillSession {
    id: SpillId,
    dir: PathBuf,
}

impl SpillSession {
    /// Create `<root>/flux-<id>` for a fresh session id.
    pub fn create(root: impl AsRef<Path>) -> Result<Arc<Self>> {
        let id = SpillId::fresh();
        let dir = root.as_ref().join(format!("flux-{:016x}", id.get()));
        fs::create_dir_all(&dir)?;
        tracing::debug!(spill = %id, dir = %dir.display(), "spill session created");
        Ok(Arc::new(Self { id, dir }))
    }

    pub fn id(&self) -> SpillId {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for SpillSession {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => tracing::trace!(spill = %self.id, "spill session removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                spill = %self.id,
                dir = %self.dir.display(),
                error = %e,
                "failed to remove spill session"
            ),
        }
    }
}

/// A single chunk file; deleted when the last handle drops.
#[derive(Debug)]
pub struct ChunkFile {
    path: PathBuf,
    _session: Arc<SpillSession>,
}

impl ChunkFile {
    pub fn new(path: PathBuf, session: Arc<SpillSession>) -> Arc<Self> {
        Arc::new(Self {
            path,
            _session: session,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ChunkFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove chunk file"
            ),
        }
    }
}
