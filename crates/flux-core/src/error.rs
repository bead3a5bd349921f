use std::sync::Arc;

use thiserror::Error;

/// Canonical result for every flux crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by all stages of a pipeline.
///
/// Errors travel inside streams as `Err` items, and `tee` has to hand the same
/// failure to several consumers, so the type is `Clone`.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An item does not have the shape its variant requires.
    #[error("validation error: {0}")]
    Validation(String),

    /// A schema-driven cast failed.
    #[error("cast error: {0}")]
    Cast(String),

    /// Malformed selector, split or join arguments.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// An operation that needs an item ran on an empty stream.
    #[error("stream exhausted: {0}")]
    Exhausted(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(String),

    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// Spill storage failures (write, read-back, checksum).
    #[error("spill error: {0}")]
    Spill(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}
