//! Sorting streams: stable in-memory sort, or spill-to-disk external sort
//! when the input may not fit the configured item budget.

pub mod external;
pub mod merge;
pub mod run;

use flux_core::{FluxConfig, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::stream::Stream;

pub use external::ExternalSort;
pub use merge::KWayMerge;
pub use run::{RunGenerator, RunMeta};

/// Stable decorate-sort-undecorate. Equal keys keep their input order in
/// both directions.
pub(crate) fn sort_items<T, K, F>(items: Vec<T>, mut key: F, reverse: bool) -> Vec<T>
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    let mut keyed: Vec<(K, T)> = items.into_iter().map(|item| (key(&item), item)).collect();
    if reverse {
        keyed.sort_by(|(a, _), (b, _)| b.cmp(a));
    } else {
        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    }
    keyed.into_iter().map(|(_, item)| item).collect()
}

impl<T: 'static> Stream<T> {
    /// Collect and sort in memory. The result is materialized.
    pub fn memory_sort_by_key<K, F>(self, key: F, reverse: bool) -> Result<Stream<T>>
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        let items = self.collect_vec()?;
        Ok(Stream::from_vec(sort_items(items, key, reverse)))
    }

    /// External sort regardless of size.
    pub fn disk_sort_by_key<K, F>(
        self,
        key: F,
        reverse: bool,
        config: &FluxConfig,
    ) -> Result<Stream<T>>
    where
        T: Serialize + DeserializeOwned,
        K: Ord + 'static,
        F: Fn(&T) -> K + 'static,
    {
        ExternalSort::new(config.clone(), reverse).sort(self, key)
    }

    /// Sort in memory when the stream is materialized or known to fit,
    /// otherwise spill.
    pub fn sort_by_key<K, F>(self, key: F, reverse: bool, config: &FluxConfig) -> Result<Stream<T>>
    where
        T: Serialize + DeserializeOwned,
        K: Ord + 'static,
        F: Fn(&T) -> K + 'static,
    {
        if self.is_materialized() || !config.exceeds_memory(self.expected_count()) {
            self.memory_sort_by_key(key, reverse)
        } else {
            self.disk_sort_by_key(key, reverse, config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sort_is_stable() {
        let items = vec![(2, "a"), (1, "b"), (2, "c"), (1, "d")];
        let asc = Stream::from_vec(items.clone())
            .memory_sort_by_key(|x| x.0, false)
            .expect("sort")
            .collect_vec()
            .expect("collect");
        assert_eq!(asc, vec![(1, "b"), (1, "d"), (2, "a"), (2, "c")]);

        let desc = Stream::from_vec(items)
            .memory_sort_by_key(|x| x.0, true)
            .expect("sort")
            .collect_vec()
            .expect("collect");
        assert_eq!(desc, vec![(2, "a"), (2, "c"), (1, "b"), (1, "d")]);
    }

    #[test]
    fn small_known_count_stays_in_memory() {
        let cfg = FluxConfig::default().with_max_items_in_memory(Some(100));
        let sorted = Stream::lazy(vec![3i64, 1, 2], Some(3))
            .sort_by_key(|i| *i, false, &cfg)
            .expect("sort");
        assert!(sorted.is_materialized());
        assert_eq!(sorted.collect_vec().expect("collect"), vec![1, 2, 3]);
    }
}
