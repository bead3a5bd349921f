//! In-memory sequences as lazy streams.

use flux_core::Value;
use flux_operators::{AnyFlux, Stream};

/// Lazy stream over `items` with an exact count.
pub fn from_sequence<T: 'static>(items: Vec<T>) -> Stream<T> {
    let count = items.len() as u64;
    Stream::lazy(items, Some(count))
}

pub fn from_values(items: Vec<Value>) -> AnyFlux {
    AnyFlux::from_stream(from_sequence(items))
}

/// Any iterator of values; the count is unknown.
pub fn from_iterable<I>(items: I) -> AnyFlux
where
    I: IntoIterator<Item = Value>,
    I::IntoIter: 'static,
{
    AnyFlux::from_stream(Stream::lazy(items, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_lazy_with_count() {
        let s = from_sequence(vec![1, 2, 3]);
        assert!(!s.is_materialized());
        assert_eq!(s.expected_count(), Some(3));
        assert_eq!(s.collect_vec().expect("collect"), vec![1, 2, 3]);
    }

    #[test]
    fn iterable_has_unknown_count() {
        let flux = from_iterable((0..4i64).map(Value::from));
        assert_eq!(flux.expected_count(), None);
        assert_eq!(flux.final_count().expect("count"), 4);
    }
}
