//! Engine handle: the published index and its lifecycle.
//!
//! The engine owns at most one [`CapabilityIndex`] at a time, behind an
//! atomic pointer. A build runs entirely off to the side and is published
//! with a single swap, so readers see either the old index or the new one,
//! never a half-built one. A failed build leaves the previous index in place.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;

use crate::attributes::AttributeMap;
use crate::config::CapdexConfig;
use crate::error::Result;
use crate::index::{CapabilityIndex, IndexBuilder, IndexStats, LookupReport};
use crate::source::{IniRecords, Record};

/// Shared handle to the capability index.
///
/// Cloning is cheap; all clones observe the same published index.
///
/// # Examples
///
/// ```
/// use capdex_core::{Engine, Record};
///
/// let engine = Engine::default();
/// engine.initialize(vec![
///     Ok(Record::new("Mozilla/5.0*", &[("Browser", "Mozilla")])),
/// ])?;
///
/// let attrs = engine.lookup("Mozilla/5.0 (X11)").expect("match");
/// assert_eq!(attrs["Browser"], "Mozilla");
/// # Ok::<(), capdex_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    config: Arc<CapdexConfig>,
    current: Arc<ArcSwapOption<CapabilityIndex>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            config: Arc::new(CapdexConfig::default()),
            current: Arc::new(ArcSwapOption::empty()),
        }
    }
}

impl Engine {
    /// Creates an engine with no index loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `config` fails
    /// validation.
    pub fn new(config: CapdexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            current: Arc::new(ArcSwapOption::empty()),
        })
    }

    /// Builds an index from `records` and publishes it.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by the feed. The previously
    /// published index, if any, stays in effect.
    pub fn initialize<I>(&self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        self.build_and_publish(records, "initialized")
    }

    /// Builds an index from an INI capability file and publishes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read and
    /// [`Error::Load`](crate::Error::Load) if it is malformed.
    pub fn initialize_from_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening capability file");
        self.initialize(IniRecords::open(path)?)
    }

    /// Rebuilds from a fresh feed and swaps the result in.
    ///
    /// Lookups running during the rebuild keep using the old index.
    ///
    /// # Errors
    ///
    /// Same as [`initialize`](Self::initialize).
    pub fn reload<I>(&self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        self.build_and_publish(records, "reloaded")
    }

    fn build_and_publish<I>(&self, records: I, action: &'static str) -> Result<()>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        let started = Instant::now();
        let index = match IndexBuilder::from_records(&self.config, records) {
            Ok(index) => index,
            Err(e) => {
                tracing::error!(code = e.code(), error = %e, "index build failed, keeping previous index");
                return Err(e);
            }
        };

        tracing::info!(
            patterns = index.len(),
            version = index.version().unwrap_or("-"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "capability index {action}"
        );
        self.current.store(Some(Arc::new(index)));
        Ok(())
    }

    /// Resolved attributes of the best pattern for `query`.
    ///
    /// Returns `None` when nothing matches or nothing is loaded; use
    /// [`is_initialized`](Self::is_initialized) to tell the two apart.
    #[must_use]
    pub fn lookup(&self, query: &str) -> Option<AttributeMap> {
        self.snapshot()?.lookup(query)
    }

    /// Diagnostic lookup, or `None` if nothing is loaded.
    #[must_use]
    pub fn explain(&self, query: &str) -> Option<LookupReport> {
        self.snapshot().map(|index| index.explain(query))
    }

    /// Version marker of the published index.
    #[must_use]
    pub fn current_version(&self) -> Option<String> {
        self.snapshot()?.version().map(str::to_string)
    }

    /// Returns true once an index has been published.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.current.load().is_some()
    }

    /// The published index, held alive for as long as the caller keeps it.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<CapabilityIndex>> {
        self.current.load_full()
    }

    /// Statistics of the published index.
    #[must_use]
    pub fn stats(&self) -> Option<IndexStats> {
        self.snapshot().map(|index| index.stats().clone())
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &CapdexConfig {
        &self.config
    }
}
