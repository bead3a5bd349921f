//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::path::Path;

use flux::prelude::*;
use tempfile::TempDir;

/// Fresh spill root, removed when the guard drops.
pub fn create_temp_spill_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("flux-test-spill-")
        .tempdir()
        .expect("create spill dir")
}

/// Config that always spills, with `chunk_items` items per run.
pub fn spill_config(root: &Path, chunk_items: usize) -> FluxConfig {
    FluxConfig::default()
        .with_spill_dir(root.to_string_lossy())
        .with_chunk_items(chunk_items)
        .with_max_items_in_memory(Some(1))
}

/// Deterministic pseudo-random integers in `0..modulo`.
pub fn scrambled_ints(n: usize, modulo: i64, seed: u64) -> Vec<i64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as i64).rem_euclid(modulo)
        })
        .collect()
}

pub fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

pub fn is_sorted<T: PartialOrd>(items: &[T]) -> bool {
    items.windows(2).all(|w| w[0] <= w[1])
}
