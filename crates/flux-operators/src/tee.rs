//! Fan-out of one lazy stream into several independent consumers.
//!
//! Consumers share a buffer of items some consumer has pulled but not every
//! consumer has seen yet. The buffer only grows as far as the fastest
//! consumer runs ahead of the slowest one; dropped consumers stop holding
//! items back.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use flux_core::{Error, Result};

use crate::stream::{Items, Stream};

struct TeeShared<T> {
    source: Items<T>,
    buffer: VecDeque<Result<T>>,
    /// Absolute position of `buffer[0]`.
    base: u64,
    /// Next absolute position per consumer; `None` once it is dropped.
    positions: Vec<Option<u64>>,
    exhausted: bool,
}

impl<T: Clone> TeeShared<T> {
    fn pull(&mut self, consumer: usize) -> Option<Result<T>> {
        let pos = self.positions[consumer]?;
        let offset = (pos - self.base) as usize;
        let item = match self.buffer.get(offset) {
            Some(item) => item.clone(),
            None => {
                if self.exhausted {
                    return None;
                }
                match self.source.next() {
                    Some(item) => {
                        self.buffer.push_back(item.clone());
                        item
                    }
                    None => {
                        self.exhausted = true;
                        return None;
                    }
                }
            }
        };
        self.positions[consumer] = Some(pos + 1);
        self.trim();
        Some(item)
    }

    fn release(&mut self, consumer: usize) {
        self.positions[consumer] = None;
        self.trim();
    }

    fn trim(&mut self) {
        match self.positions.iter().flatten().min().copied() {
            Some(slowest) => {
                while self.base < slowest && self.buffer.pop_front().is_some() {
                    self.base += 1;
                }
            }
            None => self.buffer.clear(),
        }
    }
}

struct TeeCursor<T: Clone> {
    shared: Rc<RefCell<TeeShared<T>>>,
    consumer: usize,
}

impl<T: Clone> Iterator for TeeCursor<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.shared.borrow_mut().pull(self.consumer)
    }
}

impl<T: Clone> Drop for TeeCursor<T> {
    fn drop(&mut self) {
        self.shared.borrow_mut().release(self.consumer);
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Split into `n` streams that each yield the full sequence. Every copy
    /// carries the source's count hint.
    pub fn tee(self, n: usize) -> Result<Vec<Stream<T>>> {
        if n == 0 {
            return Err(Error::Argument("tee needs at least one consumer".into()));
        }
        Ok(self.fan_out(n))
    }

    /// `tee` for callers that already know `n >= 1`.
    pub(crate) fn fan_out(self, n: usize) -> Vec<Stream<T>> {
        if n == 1 {
            return vec![self];
        }
        if let Some(copy) = self.try_clone() {
            let mut out: Vec<Stream<T>> = (1..n).filter_map(|_| copy.try_clone()).collect();
            out.insert(0, copy);
            return out;
        }

        let count = self.expected_count();
        let shared = Rc::new(RefCell::new(TeeShared {
            source: self.into_items(),
            buffer: VecDeque::new(),
            base: 0,
            positions: vec![Some(0); n],
            exhausted: false,
        }));
        (0..n)
            .map(|consumer| {
                let cursor = TeeCursor {
                    shared: Rc::clone(&shared),
                    consumer,
                };
                Stream::from_results(cursor, count)
            })
            .collect()
    }
}
