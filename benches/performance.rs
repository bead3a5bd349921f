use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use flux::prelude::*;

fn make_items(n: usize) -> Vec<i64> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 1_000_000) as i64
        })
        .collect()
}

fn bench_sorts(c: &mut Criterion) {
    let spill_root = std::env::temp_dir().join("flux-bench-spill");
    let mut group = c.benchmark_group("sort");
    for &n in &[10_000usize, 100_000] {
        let items = make_items(n);
        group.bench_with_input(BenchmarkId::new("memory", n), &items, |b, items| {
            b.iter(|| {
                Stream::lazy(items.clone(), Some(n as u64))
                    .memory_sort_by_key(|i| *i, false)
                    .and_then(|s| s.final_count())
                    .expect("memory sort")
            })
        });

        let config = FluxConfig::default()
            .with_spill_dir(spill_root.to_string_lossy())
            .with_chunk_items(n / 8)
            .with_max_items_in_memory(Some(1));
        group.bench_with_input(BenchmarkId::new("disk", n), &items, |b, items| {
            b.iter(|| {
                Stream::lazy(items.clone(), Some(n as u64))
                    .disk_sort_by_key(|i| *i, false, &config)
                    .and_then(|s| s.final_count())
                    .expect("disk sort")
            })
        });
    }
    group.finish();
}

fn bench_group_by_key(c: &mut Criterion) {
    let pairs: Vec<(i64, i64)> = make_items(50_000)
        .into_iter()
        .enumerate()
        .map(|(i, k)| (k % 1_000, i as i64))
        .collect();
    let config = FluxConfig::default();
    c.bench_function("group_by_key_50k", |b| {
        b.iter(|| {
            PairsFlux::from_pairs(pairs.clone())
                .group_by_key(&config)
                .and_then(|g| g.final_count())
                .expect("group")
        })
    });
}

criterion_group!(benches, bench_sorts, bench_group_by_key);
criterion_main!(benches);
