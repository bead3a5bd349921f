//! Map-side join over keyed streams.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use flux_core::Result;
use tracing::debug;

use super::JoinType;
use crate::stream::Stream;

/// Join `left` against the fully loaded `right` side.
///
/// `right` is single-valued: a repeated key overwrites the earlier value but
/// keeps its first-insertion position. Matched left values go through
/// `merge`. Right-only entries (for `Right` and `Outer`) follow the left
/// stream in first-insertion order.
pub fn map_side_join<K, V, R, M>(
    left: Stream<(K, V)>,
    right: R,
    how: JoinType,
    mut merge: M,
) -> Result<Stream<(K, V)>>
where
    K: Eq + Hash + Clone + 'static,
    V: 'static,
    R: IntoIterator<Item = Result<(K, V)>>,
    M: FnMut(V, &V) -> V + 'static,
{
    let mut lookup: HashMap<K, V> = HashMap::new();
    let mut order: Vec<K> = Vec::new();
    for entry in right {
        let (k, v) = entry?;
        if lookup.insert(k.clone(), v).is_none() {
            order.push(k);
        }
    }
    debug!(right_keys = lookup.len(), %how, "map-side join: right side loaded");

    let count = match how {
        JoinType::Left => left.expected_count(),
        _ => None,
    };
    let mut left_items = left.into_items();
    let mut matched: HashSet<K> = HashSet::new();
    let mut left_done = false;
    let mut right_only = order.into_iter();

    let joined = std::iter::from_fn(move || {
        while !left_done {
            match left_items.next() {
                Some(Ok((k, v))) => match lookup.get(&k) {
                    Some(r) => {
                        let merged = merge(v, r);
                        if how.emits_right_only() {
                            matched.insert(k.clone());
                        }
                        return Some(Ok((k, merged)));
                    }
                    None if how.keeps_unmatched_left() => return Some(Ok((k, v))),
                    None => continue,
                },
                Some(Err(e)) => return Some(Err(e)),
                None => left_done = true,
            }
        }
        if !how.emits_right_only() {
            return None;
        }
        for k in right_only.by_ref() {
            if matched.contains(&k) {
                continue;
            }
            if let Some(v) = lookup.remove(&k) {
                return Some(Ok((k, v)));
            }
        }
        None
    });
    Ok(Stream::from_results(joined, count))
}
