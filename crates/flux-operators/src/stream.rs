//! The lazy stream core.
//!
//! A `Stream<T>` yields `Result<T>` items and carries an optional count hint.
//! It is either materialized (an in-memory buffer that can be inspected,
//! sliced and cloned) or lazy (a boxed one-shot iterator). Transforms consume
//! their input, so a lazy stream can only ever be read once.

use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;

use flux_core::{Error, Result};

/// Boxed item iterator behind a lazy stream.
pub type Items<T> = Box<dyn Iterator<Item = Result<T>>>;

enum Source<T> {
    Memory(VecDeque<T>),
    Lazy(Items<T>),
}

pub struct Stream<T> {
    source: Source<T>,
    // Only meaningful for lazy streams; a materialized stream knows its length.
    count: Option<u64>,
}

impl<T: 'static> Stream<T> {
    /// Materialized stream over `items`; the count is exact.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            source: Source::Memory(items.into()),
            count: None,
        }
    }

    /// Lazy stream over infallible items with a count hint.
    pub fn lazy<I>(items: I, count: Option<u64>) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self::from_results(items.into_iter().map(Ok), count)
    }

    /// Lazy stream over fallible items with a count hint.
    pub fn from_results<I>(items: I, count: Option<u64>) -> Self
    where
        I: IntoIterator<Item = Result<T>>,
        I::IntoIter: 'static,
    {
        Self {
            source: Source::Lazy(Box::new(items.into_iter())),
            count,
        }
    }

    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn expected_count(&self) -> Option<u64> {
        match &self.source {
            Source::Memory(items) => Some(items.len() as u64),
            Source::Lazy(_) => self.count,
        }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.source, Source::Memory(_))
    }

    /// Override the count hint. Ignored for materialized streams, whose count
    /// is always their length.
    pub fn with_count(mut self, count: Option<u64>) -> Self {
        self.count = count;
        self
    }

    /// Borrowing iterator over a materialized stream.
    pub fn iter(&self) -> Option<impl Iterator<Item = &T> + '_> {
        match &self.source {
            Source::Memory(items) => Some(items.iter()),
            Source::Lazy(_) => None,
        }
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        match &self.source {
            Source::Memory(items) => items.get(idx),
            Source::Lazy(_) => None,
        }
    }

    /// Copy out a sub-range of a materialized stream. The range is clamped.
    pub fn slice(&self, range: Range<usize>) -> Result<Self>
    where
        T: Clone,
    {
        match &self.source {
            Source::Memory(items) => {
                let end = range.end.min(items.len());
                let start = range.start.min(end);
                Ok(Self::from_vec(items.range(start..end).cloned().collect()))
            }
            Source::Lazy(_) => Err(Error::Argument(
                "slice requires a materialized stream".into(),
            )),
        }
    }

    /// Clone a materialized stream. Lazy streams cannot be cloned; use `tee`.
    pub fn try_clone(&self) -> Option<Self>
    where
        T: Clone,
    {
        match &self.source {
            Source::Memory(items) => Some(Self {
                source: Source::Memory(items.clone()),
                count: None,
            }),
            Source::Lazy(_) => None,
        }
    }

    /// Give up the stream wrapper and keep the raw item iterator.
    pub fn into_items(self) -> Items<T> {
        match self.source {
            Source::Memory(items) => Box::new(items.into_iter().map(Ok)),
            Source::Lazy(iter) => iter,
        }
    }

    pub fn map<U, F>(self, mut f: F) -> Stream<U>
    where
        U: 'static,
        F: FnMut(T) -> U + 'static,
    {
        match self.source {
            Source::Memory(items) => Stream::from_vec(items.into_iter().map(f).collect()),
            Source::Lazy(iter) => Stream {
                source: Source::Lazy(Box::new(iter.map(move |r| r.map(&mut f)))),
                count: self.count,
            },
        }
    }

    /// Fallible element-wise transform. The first failure surfaces as an
    /// `Err` item when the stream is pulled.
    pub fn try_map<U, F>(self, mut f: F) -> Stream<U>
    where
        U: 'static,
        F: FnMut(T) -> Result<U> + 'static,
    {
        let count = self.expected_count();
        Stream::from_results(self.into_items().map(move |r| r.and_then(&mut f)), count)
    }

    pub fn flat_map<U, I, F>(self, mut f: F) -> Stream<U>
    where
        U: 'static,
        I: IntoIterator<Item = U>,
        I::IntoIter: 'static,
        F: FnMut(T) -> I + 'static,
    {
        let iter = self.into_items().flat_map(move |r| -> Items<U> {
            match r {
                Ok(item) => Box::new(f(item).into_iter().map(Ok)),
                Err(e) => Box::new(std::iter::once(Err(e))),
            }
        });
        Stream::from_results(iter, None)
    }

    /// Keep items matching `pred`. Eager (and exactly counted) on a
    /// materialized stream; otherwise lazy with an unknown count.
    pub fn filter<P>(self, mut pred: P) -> Self
    where
        P: FnMut(&T) -> bool + 'static,
    {
        match self.source {
            Source::Memory(mut items) => {
                items.retain(|item| pred(item));
                Self {
                    source: Source::Memory(items),
                    count: None,
                }
            }
            Source::Lazy(iter) => Self::from_results(
                iter.filter(move |r| match r {
                    Ok(item) => pred(item),
                    Err(_) => true,
                }),
                None,
            ),
        }
    }

    /// AND-combination of several predicates.
    pub fn filter_all(self, mut predicates: Vec<Box<dyn FnMut(&T) -> bool>>) -> Self {
        self.filter(move |item| predicates.iter_mut().all(|p| p(item)))
    }

    /// At most `n` items. Never pulls past the `n`-th item.
    pub fn take(self, n: u64) -> Self {
        let count = self.expected_count().map(|c| c.min(n));
        match self.source {
            Source::Memory(mut items) => {
                items.truncate(usize::try_from(n).unwrap_or(usize::MAX));
                Self {
                    source: Source::Memory(items),
                    count: None,
                }
            }
            Source::Lazy(mut iter) => {
                let mut remaining = n;
                let taken = std::iter::from_fn(move || {
                    if remaining == 0 {
                        return None;
                    }
                    let next = iter.next()?;
                    if next.is_ok() {
                        remaining -= 1;
                    }
                    Some(next)
                });
                Self::from_results(taken, count)
            }
        }
    }

    /// Drop the first `n` items. Errors met while skipping are still yielded.
    pub fn skip(self, n: u64) -> Self {
        let count = self.expected_count().map(|c| c.saturating_sub(n));
        match self.source {
            Source::Memory(mut items) => {
                let cut = usize::try_from(n).unwrap_or(usize::MAX).min(items.len());
                items.drain(..cut);
                Self {
                    source: Source::Memory(items),
                    count: None,
                }
            }
            Source::Lazy(mut iter) => {
                let mut to_skip = n;
                let rest = std::iter::from_fn(move || {
                    while to_skip > 0 {
                        match iter.next()? {
                            Ok(_) => to_skip -= 1,
                            Err(e) => return Some(Err(e)),
                        }
                    }
                    iter.next()
                });
                Self::from_results(rest, count)
            }
        }
    }

    /// Pair every item with its zero-based position.
    pub fn enumerate(self) -> Stream<(u64, T)> {
        let mut n = 0u64;
        self.map(move |item| {
            let idx = n;
            n += 1;
            (idx, item)
        })
    }

    /// Concatenate with another stream. `before` prepends it instead.
    pub fn add(self, other: Stream<T>, before: bool) -> Self {
        let count = match (self.expected_count(), other.expected_count()) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
        let (first, second) = if before { (other, self) } else { (self, other) };
        match (first.source, second.source) {
            (Source::Memory(mut a), Source::Memory(b)) => {
                a.extend(b);
                Self {
                    source: Source::Memory(a),
                    count: None,
                }
            }
            (a, b) => {
                let a = Stream { source: a, count: None }.into_items();
                let b = Stream { source: b, count: None }.into_items();
                Self::from_results(a.chain(b), count)
            }
        }
    }

    /// Concatenate with a raw sequence whose length is not tracked.
    pub fn add_items<I>(self, items: I, before: bool) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        let other = Stream::lazy(items, None);
        self.add(other, before)
    }

    /// Pop the first item, returning it with a stream over the remainder.
    pub fn separate_first(mut self) -> Result<(T, Self)> {
        match self.next() {
            Some(Ok(first)) => Ok((first, self)),
            Some(Err(e)) => Err(e),
            None => Err(Error::Exhausted("separate_first on an empty stream".into())),
        }
    }

    /// The next item, or `Exhausted` when there is none.
    pub fn one(&mut self) -> Result<T> {
        self.next()
            .unwrap_or_else(|| Err(Error::Exhausted("one() on an empty stream".into())))
    }

    /// Consume the stream and count what it actually yields.
    pub fn final_count(self) -> Result<u64> {
        let mut n = 0u64;
        for item in self.into_items() {
            item?;
            n += 1;
        }
        Ok(n)
    }

    /// Consume into a vector, stopping at the first error.
    pub fn collect_vec(self) -> Result<Vec<T>> {
        match self.source {
            Source::Memory(items) => Ok(items.into()),
            Source::Lazy(iter) => iter.collect(),
        }
    }

    /// Force full consumption into memory. The result is re-iterable and its
    /// count is exact.
    pub fn materialize(self) -> Result<Self> {
        if self.is_materialized() {
            return Ok(self);
        }
        Ok(Self::from_vec(self.collect_vec()?))
    }

    pub fn to_memory(self) -> Result<Self> {
        self.materialize()
    }

    /// Drain the stream for its side effects.
    pub fn pass_items(self) -> Result<()> {
        for item in self.into_items() {
            item?;
        }
        Ok(())
    }

    /// Group consecutive items into vectors of at most `step` items.
    pub fn chunks(self, step: usize) -> Result<Stream<Vec<T>>> {
        if step == 0 {
            return Err(Error::Argument("chunk step must be at least 1".into()));
        }
        let count = self
            .expected_count()
            .map(|c| c.div_ceil(step as u64));
        let mut iter = self.into_items();
        let mut failed = false;
        let chunks = std::iter::from_fn(move || {
            if failed {
                return None;
            }
            let mut chunk = Vec::with_capacity(step.min(4096));
            while chunk.len() < step {
                match iter.next() {
                    Some(Ok(item)) => chunk.push(item),
                    Some(Err(e)) => {
                        failed = true;
                        return Some(Err(e));
                    }
                    None => break,
                }
            }
            if chunk.is_empty() {
                None
            } else {
                Some(Ok(chunk))
            }
        });
        Ok(Stream::from_results(chunks, count))
    }
}

/// Pulling decrements a known count so it keeps describing what is left.
impl<T: 'static> Iterator for Stream<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            Source::Memory(items) => items.pop_front().map(Ok),
            Source::Lazy(iter) => {
                let next = iter.next();
                if let (Some(Ok(_)), Some(c)) = (&next, self.count.as_mut()) {
                    *c = c.saturating_sub(1);
                }
                next
            }
        }
    }
}

impl<T: 'static> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: 'static> From<Vec<T>> for Stream<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: 'static> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("materialized", &self.is_materialized())
            .field("expected_count", &self.expected_count())
            .finish()
    }
}

/// Concatenate streams in order.
pub fn concat<T: 'static>(streams: Vec<Stream<T>>) -> Stream<T> {
    let mut streams = streams.into_iter();
    match streams.next() {
        Some(first) => streams.fold(first, |acc, next| acc.add(next, false)),
        None => Stream::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: [i64; 9] = [1, 3, 5, 7, 9, 2, 4, 6, 8];

    fn lazy_example() -> Stream<i64> {
        Stream::lazy(EXAMPLE.to_vec(), Some(EXAMPLE.len() as u64))
    }

    #[test]
    fn map_keeps_count() {
        let s = lazy_example().map(|i| -i);
        assert_eq!(s.expected_count(), Some(9));
        let expected: Vec<i64> = EXAMPLE.iter().map(|i| -i).collect();
        assert_eq!(s.collect_vec().expect("collect"), expected);
    }

    #[test]
    fn filter_lazy_forgets_count_materialized_recounts() {
        let lazy = lazy_example().filter(|i| *i > 5);
        assert_eq!(lazy.expected_count(), None);
        assert_eq!(lazy.collect_vec().expect("collect"), vec![7, 9, 6, 8]);

        let eager = Stream::from_vec(EXAMPLE.to_vec()).filter(|i| *i > 5);
        assert!(eager.is_materialized());
        assert_eq!(eager.expected_count(), Some(4));
    }

    #[test]
    fn filter_to_nothing_is_known_zero() {
        let s = Stream::from_vec(EXAMPLE.to_vec()).filter(|i| *i > 100);
        assert_eq!(s.expected_count(), Some(0));
    }

    #[test]
    fn filter_all_is_conjunction() {
        let preds: Vec<Box<dyn FnMut(&i64) -> bool>> =
            vec![Box::new(|i| *i > 2), Box::new(|i| i % 2 == 0)];
        let out = lazy_example().filter_all(preds).collect_vec().expect("collect");
        assert_eq!(out, vec![4, 6, 8]);
    }

    #[test]
    fn take_and_skip_counts() {
        let t = lazy_example().take(5);
        assert_eq!(t.expected_count(), Some(5));
        assert_eq!(t.collect_vec().expect("collect"), vec![1, 3, 5, 7, 9]);

        let s = lazy_example().skip(5);
        assert_eq!(s.expected_count(), Some(4));
        assert_eq!(s.collect_vec().expect("collect"), vec![2, 4, 6, 8]);

        assert_eq!(lazy_example().take(50).expected_count(), Some(9));
        assert_eq!(lazy_example().skip(50).expected_count(), Some(0));
        assert_eq!(Stream::lazy(vec![1], None).take(3).expected_count(), None);
    }

    #[test]
    fn take_does_not_overpull() {
        let pulled = std::rc::Rc::new(std::cell::Cell::new(0));
        let seen = std::rc::Rc::clone(&pulled);
        let s = Stream::lazy(
            (0..100).inspect(move |_| seen.set(seen.get() + 1)),
            None,
        );
        assert_eq!(s.take(3).collect_vec().expect("collect"), vec![0, 1, 2]);
        assert_eq!(pulled.get(), 3);
    }

    #[test]
    fn map_filter_take_chain() {
        let out = lazy_example()
            .map(|i| -i)
            .filter(|i| i % 2 != 0)
            .take(3)
            .collect_vec()
            .expect("collect");
        assert_eq!(out, vec![-1, -3, -5]);
    }

    #[test]
    fn errors_survive_skip() {
        let items = vec![Ok(1), Err(Error::Validation("bad".into())), Ok(3)];
        let mut s = Stream::from_results(items, None).skip(2);
        assert!(matches!(s.next(), Some(Err(Error::Validation(_)))));
    }

    #[test]
    fn flat_map_forgets_count() {
        let s = lazy_example().flat_map(|i| vec![i; 2]);
        assert_eq!(s.expected_count(), None);
        assert_eq!(s.final_count().expect("count"), 18);
    }

    #[test]
    fn add_sums_known_counts() {
        let s = Stream::from_vec(vec![1, 2]).add(lazy_example().take(2), false);
        assert_eq!(s.expected_count(), Some(4));
        assert_eq!(s.collect_vec().expect("collect"), vec![1, 2, 1, 3]);

        let before = Stream::from_vec(vec![1, 2]).add(Stream::from_vec(vec![0]), true);
        assert!(before.is_materialized());
        assert_eq!(before.collect_vec().expect("collect"), vec![0, 1, 2]);

        let unknown = Stream::from_vec(vec![1]).add(Stream::lazy(vec![2], None), false);
        assert_eq!(unknown.expected_count(), None);

        let raw = Stream::from_vec(vec![1]).add_items(vec![2, 3], true);
        assert_eq!(raw.expected_count(), None);
        assert_eq!(raw.collect_vec().expect("collect"), vec![2, 3, 1]);
    }

    #[test]
    fn concat_in_order() {
        let s = concat(vec![
            Stream::from_vec(vec![1]),
            Stream::from_vec(vec![2, 3]),
            Stream::lazy(vec![4], Some(1)),
        ]);
        assert_eq!(s.expected_count(), Some(4));
        assert_eq!(s.collect_vec().expect("collect"), vec![1, 2, 3, 4]);
        assert_eq!(concat::<i64>(vec![]).expected_count(), Some(0));
    }

    #[test]
    fn separate_first_and_exhaustion() {
        let (first, rest) = lazy_example().separate_first().expect("first");
        assert_eq!(first, 1);
        assert_eq!(rest.expected_count(), Some(8));
        assert_eq!(rest.final_count().expect("count"), 8);

        let empty = Stream::<i64>::empty().separate_first();
        assert!(matches!(empty, Err(Error::Exhausted(_))));
    }

    #[test]
    fn consumed_stream_yields_nothing() {
        let mut s = lazy_example();
        assert_eq!(s.by_ref().count(), 9);
        assert!(s.next().is_none());
        assert!(matches!(s.one(), Err(Error::Exhausted(_))));
    }

    #[test]
    fn materialized_slicing() {
        let s = lazy_example().materialize().expect("materialize");
        assert!(s.is_materialized());
        assert_eq!(s.expected_count(), Some(9));
        assert_eq!(s.get(4), Some(&9));
        let part = s.slice(2..5).expect("slice");
        assert_eq!(part.collect_vec().expect("collect"), vec![5, 7, 9]);
        let copy = s.try_clone().expect("clone");
        assert_eq!(copy.collect_vec().expect("collect"), EXAMPLE.to_vec());
        assert_eq!(s.iter().map(|it| it.count()), Some(9));

        assert!(lazy_example().slice(0..1).is_err());
    }

    #[test]
    fn take_plus_skip_reproduces_source() {
        let source = Stream::from_vec(EXAMPLE.to_vec());
        for n in 0..=EXAMPLE.len() as u64 {
            let head = source.try_clone().expect("clone").take(n);
            let tail = source.try_clone().expect("clone").skip(n);
            let joined = head.add(tail, false).collect_vec().expect("collect");
            assert_eq!(joined, EXAMPLE.to_vec(), "n = {n}");
        }
    }

    #[test]
    fn enumerate_positions() {
        let out = Stream::from_vec(vec!["a", "b"]).enumerate().collect_vec().expect("collect");
        assert_eq!(out, vec![(0, "a"), (1, "b")]);
    }

    #[test]
    fn chunks_split_by_step() {
        let chunks = lazy_example().chunks(4).expect("chunks");
        assert_eq!(chunks.expected_count(), Some(3));
        let out = chunks.collect_vec().expect("collect");
        assert_eq!(out, vec![vec![1, 3, 5, 7], vec![9, 2, 4, 6], vec![8]]);
        assert!(lazy_example().chunks(0).is_err());
    }
}
