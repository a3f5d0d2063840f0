//! Pattern compilation.
//!
//! A capability-database section name is either a plain literal, matched by
//! case-insensitive equality, or a glob where `*` matches any run of
//! characters (including none) and `?` matches exactly one character. Globs
//! are translated into anchored regular expressions: the whole query must
//! match, never a substring.
//!
//! Matching is case-insensitive by lowercasing: patterns are lowercased at
//! compile time and [`Pattern::is_match`] expects a lowercased query.

use regex::{Regex, RegexBuilder};

/// Glob metacharacter matching any run of characters.
pub const WILDCARD_ANY: char = '*';
/// Glob metacharacter matching exactly one character.
pub const WILDCARD_ONE: char = '?';

const METACHARACTERS: [char; 2] = [WILDCARD_ANY, WILDCARD_ONE];

/// How a pattern is matched against a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// No metacharacters: exact case-insensitive comparison.
    Literal,
    /// Contains `*` or `?`: compiled glob.
    Wildcard,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Lowercased literal name.
    Exact(Box<str>),
    Glob(Regex),
    /// Glob that the regex engine refused to compile.
    Never,
}

/// One compiled capability-database entry name.
#[derive(Debug, Clone)]
pub struct Pattern {
    name: Box<str>,
    kind: PatternKind,
    matcher: Matcher,
}

impl Pattern {
    /// Compiles a raw section name. Every string is compilable.
    #[must_use]
    pub fn compile(name: &str) -> Self {
        if !name.contains(METACHARACTERS) {
            return Self {
                name: name.into(),
                kind: PatternKind::Literal,
                matcher: Matcher::Exact(name.to_lowercase().into_boxed_str()),
            };
        }

        // Both sides are lowercased, so the regex itself is case-sensitive.
        let source = glob_to_regex(&name.to_lowercase());
        let matcher = match RegexBuilder::new(&source)
            .dot_matches_new_line(true)
            .build()
        {
            Ok(regex) => Matcher::Glob(regex),
            Err(e) => {
                tracing::warn!(pattern = name, error = %e, "glob could not be compiled, pattern will never match");
                Matcher::Never
            }
        };

        Self {
            name: name.into(),
            kind: PatternKind::Wildcard,
            matcher,
        }
    }

    /// Original section name, as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Matcher kind.
    #[must_use]
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Ranking weight: byte length of the declared name.
    #[must_use]
    pub fn fragment_weight(&self) -> usize {
        self.name.len()
    }

    /// Tests a query that has already been lowercased.
    #[must_use]
    pub fn is_match(&self, lowered_query: &str) -> bool {
        match &self.matcher {
            Matcher::Exact(literal) => **literal == *lowered_query,
            Matcher::Glob(regex) => regex.is_match(lowered_query),
            Matcher::Never => false,
        }
    }

    /// Maximal lowercased runs of non-metacharacters, in order.
    ///
    /// A literal pattern yields its whole lowercased name.
    #[must_use]
    pub fn literal_runs(&self) -> Vec<String> {
        self.name
            .split(METACHARACTERS)
            .filter(|run| !run.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

/// Translates a glob into an anchored regular expression source.
///
/// Literal runs are escaped; `*` becomes `.*` and `?` becomes `.`.
#[must_use]
pub fn glob_to_regex(glob: &str) -> String {
    let mut source = String::with_capacity(glob.len() + 8);
    source.push('^');

    let mut run_start = 0;
    for (i, c) in glob.char_indices() {
        if c == WILDCARD_ANY || c == WILDCARD_ONE {
            source.push_str(&regex::escape(&glob[run_start..i]));
            source.push_str(if c == WILDCARD_ANY { ".*" } else { "." });
            run_start = i + c.len_utf8();
        }
    }
    source.push_str(&regex::escape(&glob[run_start..]));

    source.push('$');
    source
}
