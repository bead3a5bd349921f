//! Splitting one stream into several by position or by predicate.
//!
//! Lazy inputs are split with `tee`, so every part can be read in any order;
//! parts read far apart will buffer the items in between.

use std::rc::Rc;

use flux_core::{Error, Result};

use crate::stream::Stream;

/// How `Stream::split` divides its input.
pub enum Split<T> {
    /// Two parts: the first `n` items and the rest.
    At(u64),
    /// `positions.len() + 1` consecutive parts cut at ascending positions.
    Positions(Vec<u64>),
    /// Two parts: matching items, then non-matching items.
    Predicate(Box<dyn Fn(&T) -> bool>),
    /// `parts` parts; each item goes to the part its key function names.
    Partition(Box<dyn Fn(&T) -> usize>, usize),
}

impl<T: Clone + 'static> Stream<T> {
    pub fn split(self, by: Split<T>) -> Result<Vec<Stream<T>>> {
        match by {
            Split::At(n) => {
                let (head, tail) = self.split_at(n);
                Ok(vec![head, tail])
            }
            Split::Positions(positions) => self.split_at_positions(&positions),
            Split::Predicate(pred) => {
                let (yes, no) = self.partition(pred);
                Ok(vec![yes, no])
            }
            Split::Partition(key, parts) => self.split_by_key(key, parts),
        }
    }

    /// `(take(n), skip(n))` over the same input.
    pub fn split_at(self, n: u64) -> (Stream<T>, Stream<T>) {
        let mut parts = self.fan_out(2).into_iter();
        match (parts.next(), parts.next()) {
            (Some(head), Some(tail)) => (head.take(n), tail.skip(n)),
            _ => (Stream::empty(), Stream::empty()),
        }
    }

    /// Cut at each of the ascending `positions`.
    pub fn split_at_positions(self, positions: &[u64]) -> Result<Vec<Stream<T>>> {
        if positions.is_empty() || positions.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::Argument(format!(
                "split positions must be non-empty and ascending: {positions:?}"
            )));
        }
        let copies = self.fan_out(positions.len() + 1);
        let mut prev = 0u64;
        let mut out = Vec::with_capacity(copies.len());
        for (i, copy) in copies.into_iter().enumerate() {
            let part = match positions.get(i) {
                Some(&pos) => copy.skip(prev).take(pos - prev),
                None => copy.skip(prev),
            };
            if let Some(&pos) = positions.get(i) {
                prev = pos;
            }
            out.push(part);
        }
        Ok(out)
    }

    /// `(matching, non_matching)`.
    pub fn partition<P>(self, pred: P) -> (Stream<T>, Stream<T>)
    where
        P: Fn(&T) -> bool + 'static,
    {
        let pred = Rc::new(pred);
        let negated = Rc::clone(&pred);
        let mut parts = self.fan_out(2).into_iter();
        match (parts.next(), parts.next()) {
            (Some(yes), Some(no)) => (
                yes.filter(move |item| pred(item)),
                no.filter(move |item| !negated(item)),
            ),
            _ => (Stream::empty(), Stream::empty()),
        }
    }

    /// Route each item to `key(item)`; keys outside `0..parts` are dropped.
    pub fn split_by_key<F>(self, key: F, parts: usize) -> Result<Vec<Stream<T>>>
    where
        F: Fn(&T) -> usize + 'static,
    {
        if parts == 0 {
            return Err(Error::Argument("split_by_key needs at least one part".into()));
        }
        let key = Rc::new(key);
        Ok(self
            .fan_out(parts)
            .into_iter()
            .enumerate()
            .map(|(i, copy)| {
                let key = Rc::clone(&key);
                copy.filter(move |item| key(item) == i)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: [i64; 9] = [1, 3, 5, 7, 9, 2, 4, 6, 8];

    fn lazy() -> Stream<i64> {
        Stream::lazy(EXAMPLE.to_vec(), Some(9))
    }

    #[test]
    fn split_at_five() {
        let (head, tail) = lazy().split_at(5);
        assert_eq!(head.expected_count(), Some(5));
        assert_eq!(tail.expected_count(), Some(4));
        // Read the tail first to exercise buffering.
        assert_eq!(tail.collect_vec().expect("tail"), vec![2, 4, 6, 8]);
        assert_eq!(head.collect_vec().expect("head"), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn positions_cover_input() {
        let parts = lazy().split_at_positions(&[2, 2, 7]).expect("split");
        let got: Vec<Vec<i64>> = parts
            .into_iter()
            .map(|p| p.collect_vec().expect("part"))
            .collect();
        assert_eq!(
            got,
            vec![vec![1, 3], vec![], vec![5, 7, 9, 2, 4], vec![6, 8]]
        );
        assert!(lazy().split_at_positions(&[3, 1]).is_err());
        assert!(lazy().split_at_positions(&[]).is_err());
    }

    #[test]
    fn predicate_split() {
        let parts = lazy()
            .split(Split::Predicate(Box::new(|i| i % 2 == 0)))
            .expect("split");
        let got: Vec<Vec<i64>> = parts
            .into_iter()
            .map(|p| p.collect_vec().expect("part"))
            .collect();
        assert_eq!(got, vec![vec![2, 4, 6, 8], vec![1, 3, 5, 7, 9]]);
    }

    #[test]
    fn partition_by_key() {
        let parts = Stream::from_vec(EXAMPLE.to_vec())
            .split(Split::Partition(Box::new(|i| (*i % 3) as usize), 3))
            .expect("split");
        let got: Vec<Vec<i64>> = parts
            .into_iter()
            .map(|p| p.collect_vec().expect("part"))
            .collect();
        assert_eq!(got, vec![vec![3, 9, 6], vec![1, 7, 4], vec![5, 2, 8]]);
    }
}
