//! Typed stream variants.
//!
//! A `Fluxed<M>` is a `Stream<Value>` plus variant metadata `M`. The variant
//! decides what a valid item looks like and which extra operations exist
//! (parsing lines, projecting rows, grouping pairs, joining records). `Flux`
//! is the closed sum over all variants for code that only learns the
//! variant at runtime.

pub mod any;
pub mod lines;
pub mod pairs;
pub mod records;
pub mod rows;
pub mod schema;

use std::fmt;

use flux_core::{Error, FluxConfig, Record, Result, Value};
use serde::{Deserialize, Serialize};

use crate::split::Split;
use crate::stream::Stream;

pub use any::{AnyFlux, AnyMeta};
pub use lines::{LinesFlux, LinesMeta};
pub use pairs::{PairsFlux, PairsMeta};
pub use records::{RecordsFlux, RecordsMeta};
pub use rows::{RowsFlux, RowsMeta};
pub use schema::{SchemaFlux, SchemaMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    Any,
    Lines,
    Rows,
    Pairs,
    Records,
    Schema,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How items are checked against their variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckMode {
    /// Trust the items.
    Off,
    /// An invalid item fails the pipeline when it is pulled.
    #[default]
    Strict,
    /// Invalid items are dropped; the count becomes unknown.
    SkipInvalid,
}

/// Per-variant metadata.
pub trait VariantMeta: Clone + fmt::Debug + 'static {
    const VARIANT: Variant;

    fn check(&self) -> CheckMode;

    fn with_check(self, check: CheckMode) -> Self;

    fn is_valid_item(&self, item: &Value) -> bool;
}

/// A value stream tagged with variant metadata.
pub struct Fluxed<M: VariantMeta> {
    stream: Stream<Value>,
    meta: M,
}

fn apply_check<M: VariantMeta>(stream: Stream<Value>, meta: &M, mode: CheckMode) -> Stream<Value> {
    match mode {
        CheckMode::Off => stream,
        CheckMode::Strict => {
            let all_valid = stream
                .iter()
                .map(|mut items| items.all(|item| meta.is_valid_item(item)));
            if all_valid == Some(true) {
                return stream;
            }
            let meta = meta.clone();
            stream.try_map(move |item| {
                if meta.is_valid_item(&item) {
                    Ok(item)
                } else {
                    Err(Error::Validation(format!(
                        "{} item rejected: {}",
                        M::VARIANT,
                        item
                    )))
                }
            })
        }
        CheckMode::SkipInvalid => {
            let meta = meta.clone();
            stream.filter(move |item| meta.is_valid_item(item))
        }
    }
}

impl<M: VariantMeta> Fluxed<M> {
    /// Wrap `stream`, checking items per `meta.check()`.
    pub fn new(stream: Stream<Value>, meta: M) -> Self {
        let stream = apply_check(stream, &meta, meta.check());
        Self { stream, meta }
    }

    /// Wrap without checking, e.g. when the producer guarantees validity.
    pub fn from_parts(stream: Stream<Value>, meta: M) -> Self {
        Self { stream, meta }
    }

    pub fn into_parts(self) -> (Stream<Value>, M) {
        (self.stream, self.meta)
    }

    pub fn into_stream(self) -> Stream<Value> {
        self.stream
    }

    pub fn stream(&self) -> &Stream<Value> {
        &self.stream
    }

    pub fn meta(&self) -> &M {
        &self.meta
    }

    pub fn variant(&self) -> Variant {
        M::VARIANT
    }

    pub fn check(&self) -> CheckMode {
        self.meta.check()
    }

    pub fn expected_count(&self) -> Option<u64> {
        self.stream.expected_count()
    }

    pub fn is_materialized(&self) -> bool {
        self.stream.is_materialized()
    }

    pub fn is_valid_item(&self, item: &Value) -> bool {
        self.meta.is_valid_item(item)
    }

    pub fn with_count(self, count: Option<u64>) -> Self {
        Self {
            stream: self.stream.with_count(count),
            meta: self.meta,
        }
    }

    /// Re-check items under `mode` and remember it for later transforms.
    pub fn validated(self, mode: CheckMode) -> Self {
        let meta = self.meta.with_check(mode);
        let stream = apply_check(self.stream, &meta, mode);
        Self { stream, meta }
    }

    /// Element-wise transform; results are re-checked against the variant.
    pub fn map<F>(self, f: F) -> Self
    where
        F: FnMut(Value) -> Value + 'static,
    {
        let stream = self.stream.map(f);
        Self::new(stream, self.meta)
    }

    pub fn try_map<F>(self, f: F) -> Self
    where
        F: FnMut(Value) -> Result<Value> + 'static,
    {
        let stream = self.stream.try_map(f);
        Self::new(stream, self.meta)
    }

    pub fn flat_map<I, F>(self, f: F) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
        F: FnMut(Value) -> I + 'static,
    {
        let stream = self.stream.flat_map(f);
        Self::new(stream, self.meta)
    }

    /// Element-wise transform into another variant. The result carries that
    /// variant's default metadata and is checked strictly.
    pub fn map_to<F>(self, to: Variant, f: F) -> Flux
    where
        F: FnMut(Value) -> Value + 'static,
    {
        Flux::from_stream(self.stream.map(f), to, CheckMode::default())
    }

    pub fn flat_map_to<I, F>(self, to: Variant, f: F) -> Flux
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
        F: FnMut(Value) -> I + 'static,
    {
        Flux::from_stream(self.stream.flat_map(f), to, CheckMode::default())
    }

    /// One record per item, built by `f`. The count is kept.
    pub fn map_to_records<F>(self, mut f: F) -> RecordsFlux
    where
        F: FnMut(Value) -> Record + 'static,
    {
        let stream = self.stream.map(move |item| Value::Record(f(item)));
        RecordsFlux::from_parts(stream, RecordsMeta::default())
    }

    /// Log the variant, metadata, count and first `n` items at debug level.
    /// The previewed items are put back in front of the stream.
    pub fn show(self, n: usize) -> Result<Self> {
        let Fluxed { mut stream, meta } = self;
        let count = stream.expected_count();
        let mut head = Vec::with_capacity(n);
        while head.len() < n {
            match stream.next() {
                Some(item) => head.push(item?),
                None => break,
            }
        }
        let variant = M::VARIANT;
        tracing::debug!(%variant, ?count, ?meta, "flux preview");
        for item in &head {
            tracing::debug!(%item, "preview item");
        }
        Ok(Self::from_parts(stream.add(Stream::from_vec(head), true), meta))
    }

    pub fn filter<P>(self, pred: P) -> Self
    where
        P: FnMut(&Value) -> bool + 'static,
    {
        let stream = self.stream.filter(pred);
        Self::from_parts(stream, self.meta)
    }

    pub fn take(self, n: u64) -> Self {
        let Fluxed { stream, meta } = self;
        Self::from_parts(stream.take(n), meta)
    }

    pub fn skip(self, n: u64) -> Self {
        let Fluxed { stream, meta } = self;
        Self::from_parts(stream.skip(n), meta)
    }

    pub fn tee(self, n: usize) -> Result<Vec<Self>> {
        let meta = self.meta;
        Ok(self
            .stream
            .tee(n)?
            .into_iter()
            .map(|stream| Self::from_parts(stream, meta.clone()))
            .collect())
    }

    /// Concatenate; the other stream is re-checked against this variant.
    pub fn add<N: VariantMeta>(self, other: Fluxed<N>, before: bool) -> Self {
        let Fluxed { stream, meta } = self;
        let other = apply_check(other.stream, &meta, meta.check());
        Self::from_parts(stream.add(other, before), meta)
    }

    pub fn add_items(self, items: Vec<Value>, before: bool) -> Self {
        let Fluxed { stream, meta } = self;
        let other = apply_check(Stream::lazy(items, None), &meta, meta.check());
        Self::from_parts(stream.add(other, before), meta)
    }

    pub fn split(self, by: Split<Value>) -> Result<Vec<Self>> {
        let meta = self.meta;
        Ok(self
            .stream
            .split(by)?
            .into_iter()
            .map(|stream| Self::from_parts(stream, meta.clone()))
            .collect())
    }

    pub fn split_at(self, n: u64) -> (Self, Self) {
        let meta = self.meta;
        let (head, tail) = self.stream.split_at(n);
        (
            Self::from_parts(head, meta.clone()),
            Self::from_parts(tail, meta),
        )
    }

    pub fn partition<P>(self, pred: P) -> (Self, Self)
    where
        P: Fn(&Value) -> bool + 'static,
    {
        let meta = self.meta;
        let (yes, no) = self.stream.partition(pred);
        (
            Self::from_parts(yes, meta.clone()),
            Self::from_parts(no, meta),
        )
    }

    pub fn separate_first(self) -> Result<(Value, Self)> {
        let meta = self.meta;
        let (first, rest) = self.stream.separate_first()?;
        Ok((first, Self::from_parts(rest, meta)))
    }

    pub fn one(&mut self) -> Result<Value> {
        self.stream.one()
    }

    pub fn materialize(self) -> Result<Self> {
        let meta = self.meta;
        let stream = self.stream.materialize()?;
        Ok(Self::from_parts(stream, meta))
    }

    pub fn collect_vec(self) -> Result<Vec<Value>> {
        self.stream.collect_vec()
    }

    pub fn final_count(self) -> Result<u64> {
        self.stream.final_count()
    }

    pub fn pass_items(self) -> Result<()> {
        self.stream.pass_items()
    }

    /// `(index, item)` pairs whose values keep this variant.
    pub fn enumerate(self) -> PairsFlux {
        let stream = self
            .stream
            .enumerate()
            .map(|(i, item)| Value::pair(Value::Int(i as i64), item));
        PairsFlux::from_parts(stream, PairsMeta::default().with_secondary(M::VARIANT))
    }

    pub fn to_any(self) -> AnyFlux {
        AnyFlux::from_parts(self.stream, AnyMeta)
    }

    /// Display form of every item, one line each.
    pub fn to_lines(self) -> LinesFlux {
        let stream = self.stream.map(|item| Value::Str(item.to_string()));
        LinesFlux::from_parts(stream, LinesMeta::default())
    }

    /// One JSON document per item.
    pub fn to_json(self) -> LinesFlux {
        let stream = self
            .stream
            .try_map(|item| Ok(Value::Str(serde_json::to_string(&item)?)));
        LinesFlux::from_parts(stream, LinesMeta::default())
    }

    /// Retag as rows; items are checked to be lists.
    pub fn into_rows_flux(self) -> RowsFlux {
        RowsFlux::new(self.stream, RowsMeta::default())
    }

    /// Retag as pairs; items are checked to be two-element lists.
    pub fn into_pairs_flux(self) -> PairsFlux {
        PairsFlux::new(self.stream, PairsMeta::default())
    }

    /// Retag as records; non-record items are wrapped as `{"item": value}`.
    pub fn into_records_flux(self) -> RecordsFlux {
        let stream = self.stream.map(|item| match item {
            Value::Record(r) => Value::Record(r),
            other => Value::Record(flux_core::types::record([("item", other)])),
        });
        RecordsFlux::from_parts(stream, RecordsMeta::default())
    }

    /// Sort by a key computed from each item.
    pub fn sort_by<K, F>(self, key: F, reverse: bool, config: &FluxConfig) -> Result<Self>
    where
        K: Ord + 'static,
        F: Fn(&Value) -> K + 'static,
    {
        let meta = self.meta;
        let stream = self.stream.sort_by_key(key, reverse, config)?;
        Ok(Self::from_parts(stream, meta))
    }

    /// Sort by the items themselves.
    pub fn sort(self, reverse: bool, config: &FluxConfig) -> Result<Self> {
        self.sort_by(Value::clone, reverse, config)
    }
}

impl<M: VariantMeta> Iterator for Fluxed<M> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.next()
    }
}

impl<M: VariantMeta> fmt::Debug for Fluxed<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fluxed")
            .field("variant", &M::VARIANT)
            .field("meta", &self.meta)
            .field("stream", &self.stream)
            .finish()
    }
}

/// Any variant, tagged at runtime.
#[derive(Debug)]
pub enum Flux {
    Any(AnyFlux),
    Lines(LinesFlux),
    Rows(RowsFlux),
    Pairs(PairsFlux),
    Records(RecordsFlux),
    Schema(SchemaFlux),
}

macro_rules! dispatch {
    ($flux:expr, $inner:ident => $body:expr) => {
        match $flux {
            Flux::Any($inner) => $body,
            Flux::Lines($inner) => $body,
            Flux::Rows($inner) => $body,
            Flux::Pairs($inner) => $body,
            Flux::Records($inner) => $body,
            Flux::Schema($inner) => $body,
        }
    };
}

macro_rules! unwrap_variant {
    ($name:ident, $tag:ident, $ty:ty) => {
        #[doc = concat!("The `", stringify!($tag), "` payload, or an argument error.")]
        pub fn $name(self) -> Result<$ty> {
            match self {
                Flux::$tag(inner) => Ok(inner),
                other => Err(Error::Argument(format!(
                    "expected {} stream, found {}",
                    Variant::$tag,
                    other.variant()
                ))),
            }
        }
    };
}

impl Flux {
    /// Tag `stream` as `variant` with default metadata.
    pub fn from_stream(stream: Stream<Value>, variant: Variant, check: CheckMode) -> Flux {
        match variant {
            Variant::Any => Flux::Any(AnyFlux::new(stream, AnyMeta)),
            Variant::Lines => {
                Flux::Lines(LinesFlux::new(stream, LinesMeta::default().with_check(check)))
            }
            Variant::Rows => Flux::Rows(RowsFlux::new(stream, RowsMeta::default().with_check(check))),
            Variant::Pairs => {
                Flux::Pairs(PairsFlux::new(stream, PairsMeta::default().with_check(check)))
            }
            Variant::Records => {
                Flux::Records(RecordsFlux::new(stream, RecordsMeta::default().with_check(check)))
            }
            Variant::Schema => {
                Flux::Schema(SchemaFlux::new(stream, SchemaMeta::default().with_check(check)))
            }
        }
    }

    pub fn variant(&self) -> Variant {
        dispatch!(self, f => f.variant())
    }

    pub fn check(&self) -> CheckMode {
        dispatch!(self, f => f.check())
    }

    pub fn expected_count(&self) -> Option<u64> {
        dispatch!(self, f => f.expected_count())
    }

    pub fn is_valid_item(&self, item: &Value) -> bool {
        dispatch!(self, f => f.is_valid_item(item))
    }

    pub fn into_stream(self) -> Stream<Value> {
        dispatch!(self, f => f.into_stream())
    }

    /// Retag as another variant; items are re-checked under `check`.
    pub fn convert(self, to: Variant, check: CheckMode) -> Flux {
        Flux::from_stream(self.into_stream(), to, check)
    }

    pub fn collect_vec(self) -> Result<Vec<Value>> {
        dispatch!(self, f => f.collect_vec())
    }

    unwrap_variant!(into_any, Any, AnyFlux);
    unwrap_variant!(into_lines, Lines, LinesFlux);
    unwrap_variant!(into_rows, Rows, RowsFlux);
    unwrap_variant!(into_pairs, Pairs, PairsFlux);
    unwrap_variant!(into_records, Records, RecordsFlux);
    unwrap_variant!(into_schema, Schema, SchemaFlux);
}

macro_rules! impl_from_fluxed {
    ($($tag:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Flux {
                fn from(f: $ty) -> Flux {
                    Flux::$tag(f)
                }
            }
        )*
    };
}

impl_from_fluxed!(
    Any => AnyFlux,
    Lines => LinesFlux,
    Rows => RowsFlux,
    Pairs => PairsFlux,
    Records => RecordsFlux,
    Schema => SchemaFlux,
);

impl Iterator for Flux {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        dispatch!(self, f => f.next())
    }
}
