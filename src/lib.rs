#![forbid(unsafe_code)]
//! flux: lazy, typed stream pipelines.
//!
//! A pipeline starts at a source in [`io::readers`], is shaped by the
//! transforms on [`Stream`] and the variant wrappers ([`LinesFlux`],
//! [`RowsFlux`], [`PairsFlux`], [`RecordsFlux`], [`SchemaFlux`]), and ends
//! in a terminal such as `collect_vec` or a sink in [`io::writers`].
//!
//! ```no_run
//! use flux::prelude::*;
//!
//! # fn main() -> flux::Result<()> {
//! let config = FluxConfig::default().with_max_items_in_memory(Some(100_000));
//! let groups = flux::io::from_text_source("pairs.tsv", &TextSourceOptions::default())?
//!     .to_pairs(b'\t')
//!     .group_by_key(&config)?;
//! LineSink::new("groups.jsonl").write(groups.to_json())?;
//! # Ok(())
//! # }
//! ```

pub use flux_core as core;
pub use flux_io as io;
pub use flux_mem as mem;
pub use flux_operators as operators;

pub use flux_core::{ColumnBatch, Error, FluxConfig, Record, Result, Value};
pub use flux_operators::{
    AnyFlux, CheckMode, Flux, Fluxed, JoinType, LinesFlux, PairsFlux, RecordSelect, RecordsFlux,
    RowsFlux, SchemaFlux, Selector, Split, Stream, Variant,
};

pub mod prelude {
    pub use flux_core::prelude::*;
    pub use flux_io::{
        count_lines, from_columnar_source, from_reader, from_sequence, from_text_source,
        from_values, Encoding, JsonlSink, LineSink, TextSourceOptions,
    };
    pub use flux_operators::{
        concat, AnyFlux, CheckMode, ExternalSort, Flux, Fluxed, JoinType, LinesFlux, PairsFlux,
        RecordSelect, RecordsFlux, RowsFlux, SchemaFlux, Selector, Split, Stream, Variant,
        VariantMeta,
    };
}
