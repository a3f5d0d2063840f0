//! # `capdex` Core
//!
//! Capability pattern index and matching engine for User-Agent strings.
//!
//! A capability database (browscap-style INI) declares thousands of glob
//! patterns such as `Mozilla/5.0 (*Windows NT 10.0*)*Firefox/*`, each with a
//! set of attributes and an optional `Parent` to inherit from. `capdex`
//! indexes the patterns once and answers "which pattern best describes this
//! User-Agent, and what are its resolved attributes?" quickly enough to sit
//! on a request path.
//!
//! ## Features
//!
//! - **Fragment index**: fixed-length substrings → Roaring bitmaps of
//!   pattern positions, over-common fragments pruned
//! - **Exhaustive fallback**: prefix buckets, longest pattern first
//! - **Inheritance**: `Parent` chains resolved with cycle and depth checks
//! - **Hot reload**: new indexes are published with an atomic swap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use capdex_core::{CapdexConfig, Engine};
//!
//! let engine = Engine::new(CapdexConfig::load()?)?;
//! engine.initialize_from_path("browscap.ini")?;
//!
//! if let Some(attrs) = engine.lookup("Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0") {
//!     println!("{}", attrs["Browser"]);
//! }
//! # Ok::<(), capdex_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// =============================================================================
// NUMERIC CAST LINTS
// =============================================================================
// Pattern positions are assigned with u32::try_from at registration. The
// remaining `as` casts narrow elapsed milliseconds for log fields.
// =============================================================================
#![allow(clippy::cast_possible_truncation)]
// =============================================================================
// STYLISTIC LINTS - Safe to allow globally (no bug risk)
// =============================================================================
#![allow(clippy::option_if_let_else)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::single_match_else)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]

pub mod attributes;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod engine;
pub mod error;
pub mod index;
pub mod pattern;
pub mod source;

pub use attributes::{AttributeMap, AttributeStore, PARENT_KEY, RECOGNIZED_KEYS};
pub use config::{
    CapdexConfig, ConfigError, IndexConfig, LoggingConfig, ResolveConfig, SourceConfig,
};
pub use engine::Engine;
pub use error::{Error, Result};
pub use index::{
    CapabilityIndex, IndexBuilder, IndexStats, LookupOutcome, LookupReport, MatchPhase,
};
pub use pattern::{Pattern, PatternKind};
pub use source::{IniRecords, Record};
