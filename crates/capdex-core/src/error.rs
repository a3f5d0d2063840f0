//! Error types for `capdex`.
//!
//! This module provides a unified error type for all `capdex` operations.
//! Error codes follow the pattern `CAPDEX-XXX` for easy debugging.
//!
//! Not finding a pattern for a query is not an error: lookups return `None`.

use thiserror::Error;

/// Result type alias for `capdex` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `capdex` operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The record feed could not be consumed (CAPDEX-001).
    ///
    /// Fatal to the initialization that raised it; a previously published
    /// index stays in effect.
    #[error("[CAPDEX-001] Load error: {0}")]
    Load(String),

    /// A `Parent` chain loops back on itself (CAPDEX-002).
    #[error("[CAPDEX-002] Cyclic parent chain for '{pattern}': {}", .chain.join(" -> "))]
    CyclicParent {
        /// Pattern whose resolution was requested.
        pattern: String,
        /// Names visited before the cycle closed, ending with the repeated name.
        chain: Vec<String>,
    },

    /// A `Parent` chain is deeper than the configured bound (CAPDEX-003).
    #[error("[CAPDEX-003] Parent chain for '{pattern}' exceeds depth {depth}")]
    ParentDepthExceeded {
        /// Pattern whose resolution was requested.
        pattern: String,
        /// Configured maximum depth.
        depth: usize,
    },

    /// Configuration error (CAPDEX-004).
    #[error("[CAPDEX-004] Configuration error: {0}")]
    Config(String),

    /// IO error (CAPDEX-005).
    #[error("[CAPDEX-005] IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error code (e.g., "CAPDEX-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Load(_) => "CAPDEX-001",
            Self::CyclicParent { .. } => "CAPDEX-002",
            Self::ParentDepthExceeded { .. } => "CAPDEX-003",
            Self::Config(_) => "CAPDEX-004",
            Self::Io(_) => "CAPDEX-005",
        }
    }

    /// Returns true if the engine keeps serving after this error.
    ///
    /// Parent-chain errors are recovered inside attribute resolution; load
    /// and IO errors leave the previously published index in place.
    /// Configuration errors prevent an engine from being built at all.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
