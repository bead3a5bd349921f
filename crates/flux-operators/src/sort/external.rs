//! External sort with run generation and k-way merge.

use flux_core::{Error, FluxConfig, Result};
use flux_mem::{ChunkLabel, SpillManager};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::merge::KWayMerge;
use super::run::RunGenerator;
use crate::stream::Stream;

/// External sort operator.
///
/// Splits the input into sorted runs of at most `chunk_items` items, spills
/// each run to its own chunk file and merges the runs lazily. When the input
/// count is unknown, the whole input is first dumped to the `total` chunk so
/// the count is known before the runs are cut.
#[derive(Debug, Clone)]
pub struct ExternalSort {
    config: FluxConfig,
    reverse: bool,
}

impl ExternalSort {
    pub fn new(config: FluxConfig, reverse: bool) -> Self {
        Self { config, reverse }
    }

    pub fn sort<T, K, F>(&self, input: Stream<T>, key: F) -> Result<Stream<T>>
    where
        T: Serialize + DeserializeOwned + 'static,
        K: Ord + 'static,
        F: Fn(&T) -> K + 'static,
    {
        self.config.validate()?;
        let mut spill_mgr = SpillManager::new(&self.config)?;
        let mut generator = RunGenerator::new(&key, self.reverse, self.config.chunk_items);

        match input.expected_count() {
            Some(count) => {
                debug!(count, step = self.config.chunk_items, "external sort: known count");
                generator.extend(input, &mut spill_mgr)?;
            }
            None => {
                let mut dump = spill_mgr.create_chunk(ChunkLabel::Total)?;
                for item in input {
                    dump.push(&item?)?;
                }
                let total = dump.finish()?;
                debug!(
                    count = total.items,
                    bytes = total.bytes,
                    "external sort: count discovered by pre-pass"
                );
                let reader = spill_mgr.open_chunk::<T>(&total)?;
                generator.extend(reader.map(|r| r.map_err(Error::from)), &mut spill_mgr)?;
                // `total` and its reader drop here, deleting the dump.
            }
        }
        let runs = generator.finalize(&mut spill_mgr)?;

        let count: u64 = runs.iter().map(|r| r.items).sum();
        debug!(runs = runs.len(), count, "external sort: merging runs");
        let readers = runs
            .iter()
            .map(|r| spill_mgr.open_chunk::<T>(&r.chunk))
            .collect::<flux_mem::Result<Vec<_>>>()?;
        // Readers own their chunk files; the manager and run list can go.
        drop(runs);
        drop(spill_mgr);

        Ok(Stream::from_results(
            KWayMerge::new(readers, key, self.reverse),
            Some(count),
        ))
    }
}
