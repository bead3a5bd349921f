#![forbid(unsafe_code)]
//! flux-io: sources that open streams and sinks that drain them.
//!
//! Readers are lazy: a file is read only as its stream is pulled. Sinks
//! either drain a stream eagerly (`write`) or write through as it is pulled
//! (`save`).

pub mod readers;
pub mod writers;

pub use readers::{
    count_lines, from_columnar_source, from_iterable, from_reader, from_sequence,
    from_text_source, from_values, Encoding, TextSourceOptions,
};
pub use writers::{JsonlSink, LineSink};
