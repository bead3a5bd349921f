//! Run generation for external sort.
//!
//! Accumulates items in memory up to `max_items`, stable-sorts them and
//! writes each batch to the spill session as one chunk.

use flux_core::Result;
use flux_mem::{ChunkMeta, SpillManager};
use serde::Serialize;
use tracing::debug;

use super::sort_items;

/// Metadata for a sorted run on disk.
#[derive(Clone, Debug)]
pub struct RunMeta {
    pub items: u64,
    pub chunk: ChunkMeta,
}

/// Generator for sorted runs.
pub struct RunGenerator<'k, T, F> {
    key: &'k F,
    reverse: bool,
    max_items: usize,
    accumulator: Vec<T>,
    runs: Vec<RunMeta>,
}

impl<'k, T, K, F> RunGenerator<'k, T, F>
where
    T: Serialize,
    K: Ord,
    F: Fn(&T) -> K,
{
    pub fn new(key: &'k F, reverse: bool, max_items: usize) -> Self {
        Self {
            key,
            reverse,
            max_items: max_items.max(1),
            accumulator: Vec::new(),
            runs: Vec::new(),
        }
    }

    /// Add one item, flushing a run once the accumulator is full.
    pub fn push(&mut self, item: T, spill_mgr: &mut SpillManager) -> Result<()> {
        self.accumulator.push(item);
        if self.accumulator.len() >= self.max_items {
            self.flush_run(spill_mgr)?;
        }
        Ok(())
    }

    /// Drain `items` into runs. The first failing item aborts generation.
    pub fn extend<I>(&mut self, items: I, spill_mgr: &mut SpillManager) -> Result<()>
    where
        I: IntoIterator<Item = Result<T>>,
    {
        for item in items {
            self.push(item?, spill_mgr)?;
        }
        Ok(())
    }

    fn flush_run(&mut self, spill_mgr: &mut SpillManager) -> Result<()> {
        if self.accumulator.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.accumulator);
        let sorted = sort_items(batch, self.key, self.reverse);
        let chunk = spill_mgr.write_run(&sorted)?;
        debug!(
            chunk = %chunk.label,
            items = chunk.items,
            bytes = chunk.bytes,
            "sorted run flushed"
        );
        self.runs.push(RunMeta {
            items: chunk.items,
            chunk,
        });
        Ok(())
    }

    /// Flush whatever is left and return the runs in creation order.
    pub fn finalize(mut self, spill_mgr: &mut SpillManager) -> Result<Vec<RunMeta>> {
        self.flush_run(spill_mgr)?;
        Ok(self.runs)
    }
}
