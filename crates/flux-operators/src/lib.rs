#![forbid(unsafe_code)]
//! flux-operators: lazy streams and the engines built on them.
//!
//! Design intent:
//! - Everything is pull-based, single-threaded and synchronous.
//! - Transforms take their input by value; a lazy stream can only be read once.
//! - Anything that may outgrow memory (sorting, grouping) goes through the
//!   spill manager in `flux-mem` instead of materializing.

pub mod group;
pub mod join;
pub mod mappers;
pub mod select;
pub mod sort;
pub mod split;
pub mod stream;
pub mod tee;
pub mod variant;

pub use join::JoinType;
pub use select::{RecordSelect, Selector};
pub use sort::ExternalSort;
pub use split::Split;
pub use stream::{concat, Items, Stream};
pub use variant::{
    AnyFlux, CheckMode, Flux, Fluxed, LinesFlux, PairsFlux, RecordsFlux, RowsFlux, SchemaFlux,
    Variant, VariantMeta,
};
