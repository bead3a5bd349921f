//! Stream sources.

pub mod columnar;
pub mod sequence;
pub mod text;

pub use columnar::from_columnar_source;
pub use sequence::{from_iterable, from_sequence, from_values};
pub use text::{count_lines, from_reader, from_text_source, Encoding, TextSourceOptions};
