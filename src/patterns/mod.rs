//! Dirty-pattern detection over raw source text.
//!
//! Each registry rule is tried independently against the whole snippet, so
//! a snippet can match any number of rules and results may overlap. The scan
//! is a pure function of the text and the registry.

pub mod matcher;

pub use matcher::{match_patterns, Match, PatternMatcher};
