//! External sort: disk and memory sorts agree, runs are merged stably, and
//! spill files never outlive the sorted stream.

mod test_data_gen;

use flux::prelude::*;
use test_data_gen::{create_temp_spill_dir, entries_in, is_sorted, scrambled_ints, spill_config};

#[test]
fn disk_sort_matches_memory_sort() {
    let data = scrambled_ints(97, 40, 7);
    let len = data.len();
    let in_memory = Stream::from_vec(data.clone())
        .memory_sort_by_key(|i| *i, false)
        .expect("memory sort")
        .collect_vec()
        .expect("collect");
    assert!(is_sorted(&in_memory));

    for step in [1, 2, len - 1, len, len + 1] {
        for count in [Some(len as u64), None] {
            let root = create_temp_spill_dir();
            let on_disk = Stream::lazy(data.clone(), count)
                .disk_sort_by_key(|i| *i, false, &spill_config(root.path(), step))
                .expect("disk sort");
            assert_eq!(on_disk.expected_count(), Some(len as u64));
            let on_disk = on_disk.collect_vec().expect("collect");
            assert_eq!(on_disk, in_memory, "step {step}, count {count:?}");
            assert_eq!(entries_in(root.path()), 0);
        }
    }
}

#[test]
fn non_finite_floats_sort_the_same_on_disk() {
    let root = create_temp_spill_dir();
    let values = vec![
        Value::Float(2.0),
        Value::Float(f64::INFINITY),
        Value::Float(1.0),
        Value::Float(f64::NAN),
        Value::List(vec![Value::Float(f64::NEG_INFINITY)]),
    ];
    let in_memory = AnyFlux::from_values(values.clone())
        .sort(false, &FluxConfig::default())
        .expect("memory sort")
        .collect_vec()
        .expect("collect");
    let on_disk = Stream::lazy(values, Some(5))
        .disk_sort_by_key(Value::clone, false, &spill_config(root.path(), 2))
        .expect("disk sort")
        .collect_vec()
        .expect("collect");
    assert_eq!(on_disk, in_memory);
    assert!(on_disk.iter().all(|v| !v.is_null()));
}

#[test]
fn equal_keys_keep_input_order() {
    let root = create_temp_spill_dir();
    // (key, sequence number); the sequence must stay ascending within a key.
    let data: Vec<(i64, usize)> = scrambled_ints(300, 5, 11)
        .into_iter()
        .enumerate()
        .map(|(seq, key)| (key, seq))
        .collect();

    let sorted = Stream::lazy(data, Some(300))
        .disk_sort_by_key(|(k, _)| *k, false, &spill_config(root.path(), 16))
        .expect("sort")
        .collect_vec()
        .expect("collect");

    assert_eq!(sorted.len(), 300);
    for w in sorted.windows(2) {
        assert!(w[0].0 <= w[1].0);
        if w[0].0 == w[1].0 {
            assert!(w[0].1 < w[1].1, "unstable at {w:?}");
        }
    }
}

#[test]
fn reverse_keeps_stability() {
    let root = create_temp_spill_dir();
    let data = vec![(1, 'a'), (2, 'b'), (1, 'c'), (2, 'd'), (3, 'e')];
    let sorted = Stream::lazy(data, None)
        .disk_sort_by_key(|(k, _)| *k, true, &spill_config(root.path(), 2))
        .expect("sort")
        .collect_vec()
        .expect("collect");
    assert_eq!(
        sorted,
        vec![(3, 'e'), (2, 'b'), (2, 'd'), (1, 'a'), (1, 'c')]
    );
}

#[test]
fn sort_by_key_spills_only_over_threshold() {
    let root = create_temp_spill_dir();
    let config = FluxConfig::default()
        .with_spill_dir(root.path().to_string_lossy())
        .with_chunk_items(10)
        .with_max_items_in_memory(Some(50));

    let small = Stream::lazy(scrambled_ints(40, 100, 3), Some(40))
        .sort_by_key(|i| *i, false, &config)
        .expect("small sort");
    assert_eq!(entries_in(root.path()), 0);
    assert!(is_sorted(&small.collect_vec().expect("small")));

    let large = Stream::lazy(scrambled_ints(60, 100, 3), Some(60))
        .sort_by_key(|i| *i, false, &config)
        .expect("large sort");
    assert_eq!(entries_in(root.path()), 1);
    assert_eq!(large.expected_count(), Some(60));
    assert!(is_sorted(&large.collect_vec().expect("large")));
    assert_eq!(entries_in(root.path()), 0);
}

#[test]
fn abandoned_sort_cleans_up() {
    let root = create_temp_spill_dir();
    let mut sorted = Stream::lazy(scrambled_ints(100, 1000, 5), None)
        .disk_sort_by_key(|i| *i, false, &spill_config(root.path(), 10))
        .expect("sort");
    assert!(sorted.one().is_ok());
    assert_eq!(entries_in(root.path()), 1);
    drop(sorted);
    assert_eq!(entries_in(root.path()), 0);
}

#[test]
fn records_sort_by_fields_on_disk() {
    let root = create_temp_spill_dir();
    let records: Vec<Record> = scrambled_ints(50, 10, 9)
        .into_iter()
        .enumerate()
        .map(|(i, k)| {
            flux::core::types::record([("k", Value::from(k)), ("i", Value::from(i as i64))])
        })
        .collect();
    let sorted = RecordsFlux::from_records(records)
        .sort_by_fields(&["k", "i"], false, &spill_config(root.path(), 8))
        .expect("sort")
        .collect_vec()
        .expect("collect");
    let keys: Vec<(Value, Value)> = sorted.iter().map(|r| (r.field("k"), r.field("i"))).collect();
    assert!(is_sorted(&keys));
}
