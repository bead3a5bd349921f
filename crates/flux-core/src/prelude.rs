//! Convenient re-exports for downstream crates.

pub use crate::config::FluxConfig;
pub use crate::error::{Error, Result};
pub use crate::id::SpillId;
pub use crate::schema::{CastMode, FieldDescriptor, FieldType, Schema};
pub use crate::types::{Column, ColumnBatch, Record, Value};
