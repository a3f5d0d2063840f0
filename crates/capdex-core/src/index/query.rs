//! Query evaluation.
//!
//! # Algorithm
//!
//! Phase A, indexed search:
//! 1. Lowercase the query and take its fragments.
//! 2. Collect the posting list of every fragment still in the index.
//! 3. Order the lists by ascending length: rare fragments discriminate best.
//! 4. Round-robin across the lists, one entry per list per round, verifying
//!    each candidate against the full query. The first verified candidate
//!    wins, even if a more specific pattern sits later in the same lists.
//!
//! The interleaving caps the work any single long list can cause while still
//! surfacing rare-fragment candidates first, without computing scores.
//!
//! Phase B, fallback scan: the query's prefix bucket, longest pattern first,
//! then the wildcard bucket. Every query that can match some pattern is
//! found here, in the worst case at the cost of one bucket scan.

use roaring::RoaringBitmap;
use serde::Serialize;

use super::buckets::{prefix_of, WILDCARD_BUCKET};
use super::fragment::query_fragments;
use super::CapabilityIndex;
use crate::attributes::AttributeMap;

/// Where a lookup found its match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Phase A: a candidate from the fragment index.
    Indexed,
    /// Phase B: the query's own prefix bucket.
    PrefixBucket,
    /// Phase B: the wildcard bucket.
    WildcardBucket,
    /// No pattern matched.
    NotFound,
}

/// Result of evaluating one query, before attribute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupOutcome {
    /// Position of the winning pattern.
    pub matched: Option<u32>,
    /// Phase that produced the match.
    pub phase: MatchPhase,
    /// Number of matcher invocations.
    pub candidates_tested: usize,
}

impl LookupOutcome {
    fn found(position: u32, phase: MatchPhase, candidates_tested: usize) -> Self {
        Self {
            matched: Some(position),
            phase,
            candidates_tested,
        }
    }
}

/// Diagnostic view of a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupReport {
    /// Name of the winning pattern.
    pub pattern: Option<String>,
    /// Phase that produced the match.
    pub phase: MatchPhase,
    /// Number of matcher invocations.
    pub candidates_tested: usize,
    /// Resolved attributes of the winning pattern.
    pub attributes: Option<AttributeMap>,
}

impl CapabilityIndex {
    /// Finds the best pattern for `query`.
    ///
    /// Never fails: any string, including the empty one, is a valid query.
    #[must_use]
    pub fn find(&self, query: &str) -> LookupOutcome {
        let lowered = query.to_lowercase();

        let outcome = self
            .search_indexed(&lowered)
            .or_else(|tested| self.search_buckets(&lowered, tested))
            .unwrap_or_else(|tested| LookupOutcome {
                matched: None,
                phase: MatchPhase::NotFound,
                candidates_tested: tested,
            });

        tracing::trace!(
            query,
            phase = ?outcome.phase,
            candidates = outcome.candidates_tested,
            "lookup"
        );
        outcome
    }

    /// Resolved attributes of the best pattern for `query`.
    #[must_use]
    pub fn lookup(&self, query: &str) -> Option<AttributeMap> {
        let position = self.find(query).matched?;
        let pattern = self.pattern(position)?;
        Some(self.attributes.resolve(pattern.name()))
    }

    /// Like [`lookup`](Self::lookup), reporting how the match was found.
    #[must_use]
    pub fn explain(&self, query: &str) -> LookupReport {
        let outcome = self.find(query);
        let pattern = outcome.matched.and_then(|pos| self.pattern(pos));

        LookupReport {
            pattern: pattern.map(|p| p.name().to_string()),
            phase: outcome.phase,
            candidates_tested: outcome.candidates_tested,
            attributes: pattern.map(|p| self.attributes.resolve(p.name())),
        }
    }

    /// Phase A. On a miss, returns the number of candidates tested.
    fn search_indexed(&self, lowered: &str) -> Result<LookupOutcome, usize> {
        let mut lists: Vec<&RoaringBitmap> = query_fragments(lowered, self.config.fragment_len)
            .into_iter()
            .filter_map(|fragment| self.fragments.get(fragment))
            .filter(|bitmap| !bitmap.is_empty())
            .collect();
        lists.sort_by_key(|bitmap| bitmap.len());

        let mut cursors: Vec<_> = lists.iter().map(|bitmap| bitmap.iter()).collect();
        let mut tested = RoaringBitmap::new();
        let mut candidates = 0;

        while !cursors.is_empty() {
            let mut i = 0;
            while i < cursors.len() {
                let Some(position) = cursors[i].next() else {
                    cursors.remove(i);
                    continue;
                };
                i += 1;

                if !tested.insert(position) {
                    continue;
                }
                candidates += 1;
                if self.patterns[position as usize].is_match(lowered) {
                    return Ok(LookupOutcome::found(
                        position,
                        MatchPhase::Indexed,
                        candidates,
                    ));
                }
            }
        }

        Err(candidates)
    }

    /// Phase B. On a miss, returns the total number of candidates tested.
    fn search_buckets(&self, lowered: &str, tested: usize) -> Result<LookupOutcome, usize> {
        let mut candidates = tested;
        let prefix = prefix_of(lowered, self.config.prefix_len);

        if prefix != WILDCARD_BUCKET {
            if let Some(position) = self.scan_bucket(prefix, lowered, &mut candidates) {
                return Ok(LookupOutcome::found(
                    position,
                    MatchPhase::PrefixBucket,
                    candidates,
                ));
            }
        }

        match self.scan_bucket(WILDCARD_BUCKET, lowered, &mut candidates) {
            Some(position) => Ok(LookupOutcome::found(
                position,
                MatchPhase::WildcardBucket,
                candidates,
            )),
            None => Err(candidates),
        }
    }

    fn scan_bucket(&self, prefix: &str, lowered: &str, candidates: &mut usize) -> Option<u32> {
        self.buckets.get(prefix).iter().copied().find(|&position| {
            *candidates += 1;
            self.patterns[position as usize].is_match(lowered)
        })
    }
}
