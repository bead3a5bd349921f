//! Sort-merge grouping: group adjacent items with equal keys.

use flux_core::{FluxConfig, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::stream::Stream;

impl<T: 'static> Stream<T> {
    /// Group runs of adjacent items sharing a key. Only the current run is
    /// buffered; unsorted input yields one group per run, not per key.
    pub fn sorted_group_by<K, V, KF, VF>(self, mut key: KF, mut value: VF) -> Stream<(K, Vec<V>)>
    where
        K: PartialEq + 'static,
        V: 'static,
        KF: FnMut(&T) -> K + 'static,
        VF: FnMut(T) -> V + 'static,
    {
        let mut items = self.into_items();
        let mut current: Option<(K, Vec<V>)> = None;
        let mut done = false;
        let groups = std::iter::from_fn(move || {
            if done {
                return None;
            }
            loop {
                match items.next() {
                    Some(Ok(item)) => {
                        let k = key(&item);
                        let same = matches!(&current, Some((ck, _)) if *ck == k);
                        if same {
                            if let Some((_, values)) = current.as_mut() {
                                values.push(value(item));
                            }
                        } else if let Some(group) = current.replace((k, vec![value(item)])) {
                            return Some(Ok(group));
                        }
                    }
                    Some(Err(e)) => {
                        done = true;
                        return Some(Err(e));
                    }
                    None => {
                        done = true;
                        return current.take().map(Ok);
                    }
                }
            }
        });
        Stream::from_results(groups, None)
    }

    /// Sort by `key`, then group. Every key appears in exactly one group and
    /// group keys strictly increase.
    pub fn group_by<K, V, KF, VF>(
        self,
        key: KF,
        value: VF,
        config: &FluxConfig,
    ) -> Result<Stream<(K, Vec<V>)>>
    where
        T: Serialize + DeserializeOwned,
        K: Ord + 'static,
        V: 'static,
        KF: Fn(&T) -> K + Clone + 'static,
        VF: FnMut(T) -> V + 'static,
    {
        let sorted = self.sort_by_key(key.clone(), false, config)?;
        Ok(sorted.sorted_group_by(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_adjacent_pairs() {
        let pairs = vec![(1, 11), (1, 12), (2, 21), (3, 31), (3, 32), (3, 33)];
        let groups = Stream::lazy(pairs, None)
            .sorted_group_by(|p| p.0, |p| p.1)
            .collect_vec()
            .expect("groups");
        assert_eq!(
            groups,
            vec![(1, vec![11, 12]), (2, vec![21]), (3, vec![31, 32, 33])]
        );
    }

    #[test]
    fn empty_input_has_no_groups() {
        let groups = Stream::<(i64, i64)>::empty()
            .sorted_group_by(|p| p.0, |p| p.1)
            .collect_vec()
            .expect("groups");
        assert!(groups.is_empty());
    }

    #[test]
    fn unsorted_input_repeats_keys() {
        let groups = Stream::from_vec(vec![1, 1, 2, 1])
            .sorted_group_by(|i| *i, |i| i)
            .collect_vec()
            .expect("groups");
        assert_eq!(groups, vec![(1, vec![1, 1]), (2, vec![2]), (1, vec![1])]);
    }

    #[test]
    fn group_by_sorts_first() {
        let cfg = FluxConfig::default();
        let groups = Stream::from_vec(vec![3i64, 1, 3, 2, 1])
            .group_by(|i| *i, |i| i * 10, &cfg)
            .expect("group")
            .collect_vec()
            .expect("groups");
        assert_eq!(
            groups,
            vec![(1, vec![10, 10]), (2, vec![20]), (3, vec![30, 30])]
        );
    }
}
