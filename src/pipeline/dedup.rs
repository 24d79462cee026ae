use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashMap;
use std::hash::Hash;

/// Which record survives when several share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepPolicy {
    /// First occurrence in source order.
    #[default]
    First,
    /// Last occurrence in source order.
    Last,
}

/// Deduplicates `rows` by `key`.
///
/// Output order is the order in which each key first appears, whichever
/// record is kept for it.
pub fn dedup_by_key<T, K, F>(rows: impl IntoIterator<Item = T>, policy: KeepPolicy, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::new();
    for row in rows {
        let k = key(&row);
        if let Some(&slot) = slots.get(&k) {
            if policy == KeepPolicy::Last {
                out[slot] = row;
            }
        } else {
            slots.insert(k, out.len());
            out.push(row);
        }
    }
    out
}
