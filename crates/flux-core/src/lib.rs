#![forbid(unsafe_code)]
//! flux-core: item model, schema casts, configuration and the shared error type.
//!
//! Everything here is pure data. Spilling lives in `flux-mem`, the stream
//! machinery in `flux-operators`, and file sources/sinks in `flux-io`.

pub mod config;
pub mod error;
pub mod id;
pub mod prelude;
pub mod schema;
pub mod types;

pub use config::FluxConfig;
pub use error::{Error, Result};
pub use types::{ColumnBatch, Record, Value};
