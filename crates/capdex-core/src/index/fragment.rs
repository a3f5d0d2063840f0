//! Fragment inverted index using Roaring Bitmaps.
//!
//! Maps fixed-length lowercase byte fragments to the positions of the
//! patterns containing them. Positions are assigned in registration order,
//! so iterating a bitmap visits patterns in insertion order.

use roaring::RoaringBitmap;
use rustc_hash::{FxHashMap, FxHashSet};

/// Fragments of a lowercased query.
///
/// Sliding windows of `len` bytes; a query not longer than `len` is its own
/// single fragment. Repeated windows are returned once, in first-seen order.
///
/// # Example
///
/// ```
/// use capdex_core::index::query_fragments;
///
/// let fragments = query_fragments("mozilla", 5);
/// assert_eq!(
///     fragments,
///     vec![b"mozil".as_slice(), b"ozill".as_slice(), b"zilla".as_slice()]
/// );
///
/// assert_eq!(query_fragments("wget", 5), vec![b"wget".as_slice()]);
/// ```
#[must_use]
pub fn query_fragments(lowered: &str, len: usize) -> Vec<&[u8]> {
    let bytes = lowered.as_bytes();
    if bytes.len() <= len {
        return vec![bytes];
    }

    let mut seen: FxHashSet<&[u8]> = FxHashSet::default();
    bytes
        .windows(len)
        .filter(|window| seen.insert(*window))
        .collect()
}

/// Fragments contributed by one literal run of a pattern.
///
/// Runs shorter than `len` contribute nothing: no query fragment can be
/// contained in them.
pub fn run_fragments(run: &str, len: usize) -> impl Iterator<Item = &[u8]> {
    run.as_bytes().windows(len)
}

/// Inverted index: fragment → bitmap of pattern positions.
#[derive(Debug, Default)]
pub struct FragmentIndex {
    postings: FxHashMap<Box<[u8]>, RoaringBitmap>,
}

impl FragmentIndex {
    /// Create a new empty fragment index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Records that the pattern at `position` contains `fragment`.
    pub fn insert(&mut self, fragment: &[u8], position: u32) {
        match self.postings.get_mut(fragment) {
            Some(bitmap) => {
                bitmap.insert(position);
            }
            None => {
                let mut bitmap = RoaringBitmap::new();
                bitmap.insert(position);
                self.postings.insert(fragment.into(), bitmap);
            }
        }
    }

    /// Posting list of `fragment`, if indexed.
    #[must_use]
    pub fn get(&self, fragment: &[u8]) -> Option<&RoaringBitmap> {
        self.postings.get(fragment)
    }

    /// Removes every fragment with more than `threshold` postings.
    ///
    /// Returns the number of fragments removed.
    pub fn prune(&mut self, threshold: usize) -> usize {
        let before = self.postings.len();
        self.postings.retain(|fragment, bitmap| {
            let keep = bitmap.len() <= threshold as u64;
            if !keep {
                tracing::debug!(
                    fragment = %String::from_utf8_lossy(fragment),
                    postings = bitmap.len(),
                    "pruning over-common fragment"
                );
            }
            keep
        });
        before - self.postings.len()
    }

    /// Total number of postings across all fragments.
    #[must_use]
    pub fn posting_count(&self) -> u64 {
        self.postings.values().map(RoaringBitmap::len).sum()
    }

    /// Estimated memory usage in bytes.
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        let keys: usize = self.postings.keys().map(|k| k.len() + 16).sum();
        let bitmaps: usize = self
            .postings
            .values()
            .map(RoaringBitmap::serialized_size)
            .sum();
        keys + bitmaps
    }
}
