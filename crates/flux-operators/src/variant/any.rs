//! Untyped streams: every item is valid.

use flux_core::Value;

use super::{CheckMode, Fluxed, Variant, VariantMeta};
use crate::stream::Stream;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnyMeta;

impl VariantMeta for AnyMeta {
    const VARIANT: Variant = Variant::Any;

    fn check(&self) -> CheckMode {
        CheckMode::Off
    }

    fn with_check(self, _check: CheckMode) -> Self {
        self
    }

    fn is_valid_item(&self, _item: &Value) -> bool {
        true
    }
}

pub type AnyFlux = Fluxed<AnyMeta>;

impl AnyFlux {
    pub fn from_values(values: Vec<Value>) -> Self {
        Self::from_parts(Stream::from_vec(values), AnyMeta)
    }

    pub fn from_stream(stream: Stream<Value>) -> Self {
        Self::from_parts(stream, AnyMeta)
    }
}
