//! K-way merge of sorted runs.
//!
//! Heap entries order by key, then by input index, so items with equal keys
//! come out in input order: every equal-key item of run 0 before any of
//! run 1. Runs are created in input order, which makes the merge stable.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use flux_core::{Error, Result};

struct MergeEntry<K, T> {
    key: K,
    input: usize,
    item: T,
    reverse: bool,
}

impl<K: Ord, T> MergeEntry<K, T> {
    /// Position in output order; `Less` pops first.
    fn rank(&self, other: &Self) -> Ordering {
        let by_key = if self.reverse {
            other.key.cmp(&self.key)
        } else {
            self.key.cmp(&other.key)
        };
        by_key.then(self.input.cmp(&other.input))
    }
}

impl<K: Ord, T> PartialEq for MergeEntry<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.rank(other) == Ordering::Equal
    }
}

impl<K: Ord, T> Eq for MergeEntry<K, T> {}

impl<K: Ord, T> PartialOrd for MergeEntry<K, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, T> Ord for MergeEntry<K, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap.
        other.rank(self)
    }
}

/// Streaming merge over sorted inputs. Each input holds at most one item in
/// the heap at a time.
pub struct KWayMerge<I, T, K, F> {
    inputs: Vec<I>,
    heap: BinaryHeap<MergeEntry<K, T>>,
    key: F,
    reverse: bool,
    primed: bool,
    pending: Option<Error>,
    failed: bool,
}

impl<I, T, E, K, F> KWayMerge<I, T, K, F>
where
    I: Iterator<Item = std::result::Result<T, E>>,
    E: Into<Error>,
    K: Ord,
    F: Fn(&T) -> K,
{
    pub fn new(inputs: Vec<I>, key: F, reverse: bool) -> Self {
        let heap = BinaryHeap::with_capacity(inputs.len());
        Self {
            inputs,
            heap,
            key,
            reverse,
            primed: false,
            pending: None,
            failed: false,
        }
    }

    fn advance(&mut self, input: usize) -> Result<()> {
        match self.inputs[input].next() {
            Some(Ok(item)) => {
                self.heap.push(MergeEntry {
                    key: (self.key)(&item),
                    input,
                    item,
                    reverse: self.reverse,
                });
                Ok(())
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl<I, T, E, K, F> Iterator for KWayMerge<I, T, K, F>
where
    I: Iterator<Item = std::result::Result<T, E>>,
    E: Into<Error>,
    K: Ord,
    F: Fn(&T) -> K,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(e) = self.pending.take() {
            self.failed = true;
            return Some(Err(e));
        }
        if !self.primed {
            self.primed = true;
            for input in 0..self.inputs.len() {
                if let Err(e) = self.advance(input) {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }

        let entry = self.heap.pop()?;
        if let Err(e) = self.advance(entry.input) {
            // Emit the popped item first; the failure follows on the next pull.
            self.pending = Some(e);
        }
        Some(Ok(entry.item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(data: Vec<Vec<(i64, &'static str)>>) -> Vec<std::vec::IntoIter<Result<(i64, &'static str)>>> {
        data.into_iter()
            .map(|run| run.into_iter().map(Ok).collect::<Vec<_>>().into_iter())
            .collect()
    }

    #[test]
    fn merges_in_key_order() {
        let inputs = runs(vec![
            vec![(1, "a"), (5, "b")],
            vec![(2, "c"), (3, "d")],
            vec![],
            vec![(4, "e")],
        ]);
        let out: Vec<i64> = KWayMerge::new(inputs, |x: &(i64, &str)| x.0, false)
            .map(|r| r.map(|x| x.0))
            .collect::<Result<_>>()
            .expect("merge");
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let inputs = runs(vec![
            vec![(1, "a"), (1, "b"), (2, "c")],
            vec![(1, "d"), (2, "e")],
        ]);
        let out: Vec<&str> = KWayMerge::new(inputs, |x: &(i64, &str)| x.0, false)
            .map(|r| r.map(|x| x.1))
            .collect::<Result<_>>()
            .expect("merge");
        assert_eq!(out, vec!["a", "b", "d", "c", "e"]);
    }

    #[test]
    fn reverse_picks_max_and_stays_stable() {
        let inputs = runs(vec![vec![(2, "a"), (1, "b")], vec![(2, "c"), (0, "d")]]);
        let out: Vec<&str> = KWayMerge::new(inputs, |x: &(i64, &str)| x.0, true)
            .map(|r| r.map(|x| x.1))
            .collect::<Result<_>>()
            .expect("merge");
        assert_eq!(out, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn input_failure_surfaces_after_popped_item() {
        let bad: Vec<Result<i64>> = vec![Ok(1), Err(Error::Spill("torn".into()))];
        let mut merge = KWayMerge::new(vec![bad.into_iter()], |x: &i64| *x, false);
        assert_eq!(merge.next().map(|r| r.ok()), Some(Some(1)));
        assert!(matches!(merge.next(), Some(Err(Error::Spill(_)))));
        assert!(merge.next().is_none());
    }
}
