//! Capability pattern index.
//!
//! Two structures are built once from the whole pattern corpus:
//!
//! - a fragment inverted index (fixed-length lowercase substrings → Roaring
//!   Bitmap of pattern positions) that narrows a query to a few candidates,
//! - prefix buckets (first characters of the name → patterns, longest
//!   first) that back the exhaustive fallback scan.
//!
//! Over-common fragments are pruned at [`IndexBuilder::finalize`] to bound
//! candidate fan-out; queries that only hit pruned fragments fall through to
//! the bucket scan, so pruning never costs correctness.
//!
//! A finalized [`CapabilityIndex`] is immutable and `Send + Sync`; readers
//! share it without locking.

mod buckets;
mod builder;
mod fragment;
mod query;

pub use buckets::{prefix_of, PrefixBuckets, WILDCARD_BUCKET};
pub use builder::IndexBuilder;
pub use fragment::{query_fragments, run_fragments, FragmentIndex};
pub use query::{LookupOutcome, LookupReport, MatchPhase};

#[cfg(test)]
mod builder_tests;

use serde::Serialize;

use crate::attributes::{AttributeMap, AttributeStore};
use crate::config::IndexConfig;
use crate::pattern::Pattern;

/// Statistics for a finalized index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of distinct patterns.
    pub pattern_count: usize,
    /// Patterns matched by plain comparison.
    pub literal_count: usize,
    /// Patterns matched by a compiled glob.
    pub wildcard_count: usize,
    /// Fragments kept after pruning.
    pub fragment_count: usize,
    /// Fragments removed for exceeding the prune threshold.
    pub pruned_fragments: usize,
    /// Postings across kept fragments.
    pub posting_count: u64,
    /// Number of prefix buckets.
    pub bucket_count: usize,
    /// Estimated memory usage of the index structures in bytes.
    pub memory_bytes: usize,
}

/// Immutable, queryable capability index.
#[derive(Debug)]
pub struct CapabilityIndex {
    patterns: Vec<Pattern>,
    fragments: FragmentIndex,
    buckets: PrefixBuckets,
    attributes: AttributeStore,
    config: IndexConfig,
    version: Option<String>,
    stats: IndexStats,
}

impl CapabilityIndex {
    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if the index holds no pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Pattern at `position`.
    #[must_use]
    pub fn pattern(&self, position: u32) -> Option<&Pattern> {
        self.patterns.get(position as usize)
    }

    /// Fragment inverted index.
    #[must_use]
    pub fn fragments(&self) -> &FragmentIndex {
        &self.fragments
    }

    /// Prefix buckets.
    #[must_use]
    pub fn buckets(&self) -> &PrefixBuckets {
        &self.buckets
    }

    /// Attribute store.
    #[must_use]
    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Build parameters the index was created with.
    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Version marker of the loaded database, if it declared one.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Index statistics captured at finalize.
    #[must_use]
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Resolved attributes of the pattern named `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> AttributeMap {
        self.attributes.resolve(name)
    }
}
