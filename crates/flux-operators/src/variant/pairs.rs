//! Key/value pairs: two-element lists.
//!
//! `secondary` names the variant of the values, so `values()` can hand back a
//! properly tagged stream.

use std::collections::{BTreeMap, HashSet};

use flux_core::{FluxConfig, Record, Result, Value};

use super::{
    AnyFlux, AnyMeta, CheckMode, Flux, Fluxed, RecordsFlux, RecordsMeta, Variant, VariantMeta,
};
use crate::join::{map_side_join, merge_values, JoinType};
use crate::stream::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairsMeta {
    pub check: CheckMode,
    pub secondary: Variant,
}

impl Default for PairsMeta {
    fn default() -> Self {
        Self {
            check: CheckMode::default(),
            secondary: Variant::Any,
        }
    }
}

impl PairsMeta {
    pub fn with_secondary(mut self, secondary: Variant) -> Self {
        self.secondary = secondary;
        self
    }
}

impl VariantMeta for PairsMeta {
    const VARIANT: Variant = Variant::Pairs;

    fn check(&self) -> CheckMode {
        self.check
    }

    fn with_check(mut self, check: CheckMode) -> Self {
        self.check = check;
        self
    }

    fn is_valid_item(&self, item: &Value) -> bool {
        item.as_pair().is_some()
    }
}

pub type PairsFlux = Fluxed<PairsMeta>;

fn pair_key(item: &Value) -> Value {
    item.as_pair()
        .map(|(k, _)| k.clone())
        .unwrap_or(Value::Null)
}

impl PairsFlux {
    pub fn from_pairs<K, V>(pairs: Vec<(K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        let items = pairs.into_iter().map(|(k, v)| Value::pair(k, v)).collect();
        Self::from_parts(Stream::from_vec(items), PairsMeta::default())
    }

    /// Pairs from a typed stream; the items are valid by construction.
    pub fn from_pair_stream(pairs: Stream<(Value, Value)>, meta: PairsMeta) -> Self {
        Self::from_parts(pairs.map(|(k, v)| Value::pair(k, v)), meta)
    }

    pub fn secondary(&self) -> Variant {
        self.meta().secondary
    }

    pub fn with_secondary(self, secondary: Variant) -> Self {
        let (stream, meta) = self.into_parts();
        Self::from_parts(stream, meta.with_secondary(secondary))
    }

    pub fn into_pair_stream(self) -> Stream<(Value, Value)> {
        self.into_stream().try_map(Value::into_pair)
    }

    pub fn keys(self) -> AnyFlux {
        let stream = self
            .into_pair_stream()
            .map(|(k, _)| k);
        AnyFlux::from_parts(stream, AnyMeta)
    }

    /// The values, tagged with the secondary variant.
    pub fn values(self) -> Flux {
        let secondary = self.secondary();
        let check = self.check();
        let stream = self.into_pair_stream().map(|(_, v)| v);
        Flux::from_stream(stream, secondary, check)
    }

    /// Keys in first-seen order.
    pub fn distinct_keys(self) -> Result<Vec<Value>> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for item in self.into_pair_stream() {
            let (k, _) = item?;
            if seen.insert(k.clone()) {
                keys.push(k);
            }
        }
        Ok(keys)
    }

    /// Distinct keys plus a stream over all pairs. The stream is teed, so the
    /// pairs stay buffered until it is read.
    pub fn extract_keys(self) -> Result<(Vec<Value>, PairsFlux)> {
        let mut copies = self.tee(2)?.into_iter();
        match (copies.next(), copies.next()) {
            (Some(for_keys), Some(for_items)) => Ok((for_keys.distinct_keys()?, for_items)),
            _ => Err(flux_core::Error::Argument("tee lost a copy".into())),
        }
    }

    /// Last value wins per key.
    pub fn get_dict(self) -> Result<BTreeMap<Value, Value>> {
        let mut dict = BTreeMap::new();
        for item in self.into_pair_stream() {
            let (k, v) = item?;
            dict.insert(k, v);
        }
        Ok(dict)
    }

    /// Distinct values per key, in first-seen order.
    pub fn get_dict_of_lists(self) -> Result<BTreeMap<Value, Vec<Value>>> {
        let mut dict: BTreeMap<Value, Vec<Value>> = BTreeMap::new();
        for item in self.into_pair_stream() {
            let (k, v) = item?;
            let values = dict.entry(k).or_default();
            if !values.contains(&v) {
                values.push(v);
            }
        }
        Ok(dict)
    }

    /// Collapse runs of adjacent equal keys into `(key, [values...])`.
    pub fn sorted_group_by_key(self) -> PairsFlux {
        let groups = self
            .into_pair_stream()
            .sorted_group_by(|(k, _)| k.clone(), |(_, v)| v)
            .map(|(k, values)| (k, Value::List(values)));
        PairsFlux::from_pair_stream(groups, PairsMeta::default().with_secondary(Variant::Rows))
    }

    pub fn sort_by_key(self, reverse: bool, config: &FluxConfig) -> Result<PairsFlux> {
        self.sort_by(pair_key, reverse, config)
    }

    pub fn memory_sort_by_key(self, reverse: bool) -> Result<PairsFlux> {
        let (stream, meta) = self.into_parts();
        let sorted = stream.memory_sort_by_key(pair_key, reverse)?;
        Ok(PairsFlux::from_parts(sorted, meta))
    }

    pub fn disk_sort_by_key(self, reverse: bool, config: &FluxConfig) -> Result<PairsFlux> {
        let (stream, meta) = self.into_parts();
        let sorted = stream.disk_sort_by_key(pair_key, reverse, config)?;
        Ok(PairsFlux::from_parts(sorted, meta))
    }

    /// Sort by key, then group: one `(key, [values...])` per distinct key.
    pub fn group_by_key(self, config: &FluxConfig) -> Result<PairsFlux> {
        Ok(self.sort_by_key(false, config)?.sorted_group_by_key())
    }

    /// Join against `right`, which is loaded into memory.
    pub fn map_side_join(self, right: PairsFlux, how: JoinType) -> Result<PairsFlux> {
        let (left, meta) = self.into_parts();
        let left = left.try_map(Value::into_pair);
        let joined = map_side_join(left, right.into_pair_stream(), how, merge_values)?;
        Ok(PairsFlux::from_pair_stream(joined, meta))
    }

    pub fn to_records(self, key_field: &str, value_field: &str) -> RecordsFlux {
        let key_field = key_field.to_string();
        let value_field = value_field.to_string();
        let stream = self.into_pair_stream().map(move |(k, v)| {
            let mut record = Record::new();
            record.insert(key_field.clone(), k);
            record.insert(value_field.clone(), v);
            Value::Record(record)
        });
        RecordsFlux::from_parts(stream, RecordsMeta::default())
    }
}
