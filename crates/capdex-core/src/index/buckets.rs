//! Prefix buckets for the fallback scan.
//!
//! Patterns are grouped by the first few characters of their lowercased
//! name. Names whose prefix is not purely `a..=z` (including names starting
//! with a wildcard) share the [`WILDCARD_BUCKET`]. Each bucket is ordered
//! longest name first so the most specific pattern is tested first.

use rustc_hash::FxHashMap;

use crate::pattern::Pattern;

/// Sentinel bucket for names without a purely alphabetic prefix.
pub const WILDCARD_BUCKET: &str = "*";

/// Bucket key of a lowercased string.
///
/// The first `len` characters (fewer if the string is shorter), or
/// [`WILDCARD_BUCKET`] if any of them is not an ASCII lowercase letter.
/// The empty string is its own (empty) prefix.
#[must_use]
pub fn prefix_of(lowered: &str, len: usize) -> &str {
    let end = lowered
        .char_indices()
        .nth(len)
        .map_or(lowered.len(), |(i, _)| i);
    let prefix = &lowered[..end];

    if prefix.bytes().all(|b| b.is_ascii_lowercase()) {
        prefix
    } else {
        WILDCARD_BUCKET
    }
}

/// Prefix → pattern positions.
#[derive(Debug, Default)]
pub struct PrefixBuckets {
    buckets: FxHashMap<Box<str>, Vec<u32>>,
}

impl PrefixBuckets {
    /// Create an empty set of buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if no pattern has been bucketed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Appends `position` to the bucket `prefix`.
    pub fn push(&mut self, prefix: &str, position: u32) {
        match self.buckets.get_mut(prefix) {
            Some(bucket) => bucket.push(position),
            None => {
                self.buckets.insert(prefix.into(), vec![position]);
            }
        }
    }

    /// Positions in bucket `prefix`; empty if there is no such bucket.
    #[must_use]
    pub fn get(&self, prefix: &str) -> &[u32] {
        self.buckets.get(prefix).map_or(&[][..], Vec::as_slice)
    }

    /// Orders every bucket by descending name length.
    ///
    /// The sort is stable, so equal lengths keep registration order.
    pub fn sort_by_weight(&mut self, patterns: &[Pattern]) {
        for bucket in self.buckets.values_mut() {
            bucket.sort_by_key(|&pos| std::cmp::Reverse(patterns[pos as usize].fragment_weight()));
        }
    }

    /// Estimated memory usage in bytes.
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        self.buckets
            .iter()
            .map(|(k, v)| k.len() + 16 + v.capacity() * std::mem::size_of::<u32>() + 24)
            .sum()
    }
}
