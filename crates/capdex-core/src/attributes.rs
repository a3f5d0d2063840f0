//! Declared attributes and `Parent` inheritance.
//!
//! Each pattern declares a handful of capability attributes and may name a
//! parent pattern whose attributes it inherits. Only keys on the
//! recognized-key allow-list are retained at load time, which bounds the
//! memory held per pattern.
//!
//! Resolution walks the parent chain iteratively with a visited set, so a
//! cyclic or runaway chain becomes an [`Error`] instead of unbounded
//! recursion.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::ResolveConfig;
use crate::error::{Error, Result};

/// Reserved key naming the pattern to inherit from.
pub const PARENT_KEY: &str = "Parent";

/// Attribute keys kept at load time. Everything else is dropped.
pub const RECOGNIZED_KEYS: &[&str] = &[
    PARENT_KEY,
    "Browser",
    "Version",
    "MajorVer",
    "MinorVer",
    "Browser_Type",
    "Platform",
    "Platform_Version",
    "Device_Type",
    "Comment",
    "Browser_Bits",
    "Browser_Modus",
    "Platform_Bits",
    "Alpha",
    "Beta",
    "Frames",
    "IFrames",
    "Tables",
    "Cookies",
    "BackgroundSounds",
    "JavaScript",
    "VBScript",
    "JavaApplets",
    "ActiveXControls",
    "Crawler",
    "CssVersion",
    "AolVersion",
    "Device_Name",
    "RenderingEngine_Name",
    "RenderingEngine_Version",
];

/// Resolved attributes of one pattern, ordered by key.
pub type AttributeMap = BTreeMap<String, String>;

/// Returns true if `key` is on the allow-list.
#[must_use]
pub fn is_recognized_key(key: &str) -> bool {
    RECOGNIZED_KEYS.contains(&key)
}

#[derive(Debug, Default, Clone)]
struct Declared {
    attrs: FxHashMap<Box<str>, Box<str>>,
    parent: Option<Box<str>>,
}

/// Per-pattern declared attributes with on-demand inheritance.
#[derive(Debug)]
pub struct AttributeStore {
    entries: FxHashMap<Box<str>, Declared>,
    max_parent_depth: usize,
    /// Successful resolutions, when memoization is enabled.
    memo: Option<DashMap<Box<str>, AttributeMap>>,
    /// Set once the memo holds an entry; loads only clear a populated memo.
    memo_dirty: AtomicBool,
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new(&ResolveConfig::default())
    }
}

impl AttributeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(config: &ResolveConfig) -> Self {
        Self {
            entries: FxHashMap::default(),
            max_parent_depth: config.max_parent_depth,
            memo: config.memoize.then(DashMap::new),
            memo_dirty: AtomicBool::new(false),
        }
    }

    /// Number of patterns with declared attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no pattern has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `name` has been loaded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registers the declared attributes of `name`.
    ///
    /// Keys outside the allow-list are dropped. Loading the same name again
    /// merges into the existing entry, later values winning.
    pub fn load<I>(&mut self, name: &str, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let entry = self.entries.entry(name.into()).or_default();
        for (key, value) in pairs {
            if key == PARENT_KEY {
                entry.parent = Some(value.into_boxed_str());
            } else if is_recognized_key(&key) {
                entry.attrs.insert(key.into_boxed_str(), value.into_boxed_str());
            }
        }

        if std::mem::take(self.memo_dirty.get_mut()) {
            if let Some(memo) = &self.memo {
                memo.clear();
            }
        }
    }

    /// Resolves inherited and own attributes of `name`.
    ///
    /// Unknown names resolve to an empty map. A cyclic or over-deep parent
    /// chain is logged and the acyclic part of the chain is merged.
    #[must_use]
    pub fn resolve(&self, name: &str) -> AttributeMap {
        match self.try_resolve(name) {
            Ok(attrs) => attrs,
            Err(err) => {
                tracing::warn!(pattern = name, code = err.code(), error = %err, "partial attribute resolution");
                let (chain, _) = self.walk(name);
                merge(&chain)
            }
        }
    }

    /// Resolves inherited and own attributes of `name`, surfacing chain errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicParent`] if the parent chain revisits a pattern
    /// and [`Error::ParentDepthExceeded`] if it is longer than the configured
    /// maximum depth.
    pub fn try_resolve(&self, name: &str) -> Result<AttributeMap> {
        if let Some(hit) = self.memo.as_ref().and_then(|memo| memo.get(name)) {
            return Ok(hit.value().clone());
        }

        let (chain, err) = self.walk(name);
        if let Some(err) = err {
            return Err(err);
        }

        let attrs = merge(&chain);
        if let Some(memo) = &self.memo {
            memo.insert(name.into(), attrs.clone());
            self.memo_dirty.store(true, Ordering::Relaxed);
        }
        Ok(attrs)
    }

    /// Collects `name` and its ancestors, nearest first.
    ///
    /// Stops at a missing entry, a missing parent, a revisited name or the
    /// depth bound. The returned chain never contains the same entry twice.
    fn walk<'a>(&'a self, name: &'a str) -> (Vec<&'a Declared>, Option<Error>) {
        let mut chain = Vec::new();
        let mut names: Vec<&str> = Vec::new();
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut current = name;

        while let Some(entry) = self.entries.get(current) {
            if !visited.insert(current) {
                names.push(current);
                let err = Error::CyclicParent {
                    pattern: name.to_string(),
                    chain: names.iter().map(|n| (*n).to_string()).collect(),
                };
                return (chain, Some(err));
            }
            if chain.len() > self.max_parent_depth {
                let err = Error::ParentDepthExceeded {
                    pattern: name.to_string(),
                    depth: self.max_parent_depth,
                };
                return (chain, Some(err));
            }

            chain.push(entry);
            names.push(current);
            match entry.parent.as_deref() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        (chain, None)
    }
}

/// Overlays a chain from the farthest ancestor down, so nearer keys win.
fn merge(chain: &[&Declared]) -> AttributeMap {
    let mut attrs = AttributeMap::new();
    for declared in chain.iter().rev() {
        for (key, value) in &declared.attrs {
            attrs.insert(key.to_string(), value.to_string());
        }
    }
    attrs
}
