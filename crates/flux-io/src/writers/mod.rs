//! Stream sinks.

pub mod jsonl;
pub mod lines;

pub use jsonl::JsonlSink;
pub use lines::LineSink;
