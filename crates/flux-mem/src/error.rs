use std::sync::Arc;

use thiserror::Error;

/// Result type local to flux-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("spill storage error: {0}")]
    Storage(String),

    #[error("spill I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("checksum mismatch for chunk '{0}'")]
    ChecksumMismatch(String),

    #[error("invalid chunk template: {0}")]
    Template(String),
}

impl From<Error> for flux_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(io) => flux_core::Error::Io(Arc::new(io)),
            Error::Template(msg) => flux_core::Error::Config(msg),
            other => flux_core::Error::Spill(other.to_string()),
        }
    }
}
