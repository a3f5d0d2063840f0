//! Single-threaded index construction.

use rustc_hash::FxHashMap;

use super::buckets::{prefix_of, PrefixBuckets};
use super::fragment::{query_fragments, run_fragments, FragmentIndex};
use super::{CapabilityIndex, IndexStats};
use crate::attributes::AttributeStore;
use crate::config::{CapdexConfig, IndexConfig, SourceConfig};
use crate::error::{Error, Result};
use crate::pattern::{Pattern, PatternKind};
use crate::source::Record;

/// Accumulates patterns, then seals them into a [`CapabilityIndex`].
///
/// Nothing built here is visible to readers until [`finalize`] returns.
///
/// [`finalize`]: IndexBuilder::finalize
#[derive(Debug)]
pub struct IndexBuilder {
    index_config: IndexConfig,
    source_config: SourceConfig,
    patterns: Vec<Pattern>,
    positions: FxHashMap<Box<str>, u32>,
    fragments: FragmentIndex,
    buckets: PrefixBuckets,
    attributes: AttributeStore,
}

impl IndexBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(config: &CapdexConfig) -> Self {
        Self {
            index_config: config.index.clone(),
            source_config: config.source.clone(),
            patterns: Vec::new(),
            positions: FxHashMap::default(),
            fragments: FragmentIndex::new(),
            buckets: PrefixBuckets::new(),
            attributes: AttributeStore::new(&config.resolve),
        }
    }

    /// Builds an index from a record feed.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by the feed, or a load error if the
    /// corpus has more patterns than positions can address.
    pub fn from_records<I>(config: &CapdexConfig, records: I) -> Result<CapabilityIndex>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        let mut builder = Self::new(config);
        for record in records {
            let record = record?;
            builder.register(&record.name, record.pairs)?;
        }
        Ok(builder.finalize())
    }

    /// Number of distinct patterns registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Registers one section: compiles its pattern, buckets it, indexes its
    /// fragments and stores its attributes.
    ///
    /// A name seen before only merges attributes into the existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the corpus exceeds `u32::MAX` patterns.
    pub fn register<I>(&mut self, name: &str, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if !self.positions.contains_key(name) {
            let position = u32::try_from(self.patterns.len())
                .map_err(|_| Error::Load(format!("too many patterns at '{name}'")))?;
            let pattern = Pattern::compile(name);
            let lowered = name.to_lowercase();

            self.buckets
                .push(prefix_of(&lowered, self.index_config.prefix_len), position);
            self.index_fragments(&pattern, &lowered, position);

            self.positions.insert(name.into(), position);
            self.patterns.push(pattern);
        }

        self.attributes.load(name, pairs);
        Ok(())
    }

    fn index_fragments(&mut self, pattern: &Pattern, lowered: &str, position: u32) {
        let len = self.index_config.fragment_len;
        match pattern.kind() {
            PatternKind::Literal => {
                for fragment in query_fragments(lowered, len) {
                    self.fragments.insert(fragment, position);
                }
            }
            PatternKind::Wildcard => {
                for run in pattern.literal_runs() {
                    for fragment in run_fragments(&run, len) {
                        self.fragments.insert(fragment, position);
                    }
                }
            }
        }
    }

    /// Prunes over-common fragments, orders the buckets and seals the index.
    #[must_use]
    pub fn finalize(mut self) -> CapabilityIndex {
        let pruned_fragments = self.fragments.prune(self.index_config.prune_threshold);
        self.buckets.sort_by_weight(&self.patterns);

        let version = self
            .attributes
            .contains(&self.source_config.version_section)
            .then(|| {
                self.attributes
                    .resolve(&self.source_config.version_section)
                    .remove(&self.source_config.version_key)
            })
            .flatten();

        let literal_count = self
            .patterns
            .iter()
            .filter(|p| p.kind() == PatternKind::Literal)
            .count();
        let stats = IndexStats {
            pattern_count: self.patterns.len(),
            literal_count,
            wildcard_count: self.patterns.len() - literal_count,
            fragment_count: self.fragments.len(),
            pruned_fragments,
            posting_count: self.fragments.posting_count(),
            bucket_count: self.buckets.len(),
            memory_bytes: self.fragments.memory_bytes() + self.buckets.memory_bytes(),
        };

        tracing::debug!(
            patterns = stats.pattern_count,
            wildcards = stats.wildcard_count,
            fragments = stats.fragment_count,
            pruned = stats.pruned_fragments,
            buckets = stats.bucket_count,
            version = version.as_deref().unwrap_or("unknown"),
            "capability index finalized"
        );

        CapabilityIndex {
            patterns: self.patterns,
            fragments: self.fragments,
            buckets: self.buckets,
            attributes: self.attributes,
            config: self.index_config,
            version,
            stats,
        }
    }
}
