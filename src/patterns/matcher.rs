use crate::rules::{Rule, RuleRegistry};
use regex::Regex;
use serde::Serialize;

/// A rule whose pattern occurs somewhere in the scanned text.
#[derive(Debug, Clone, Serialize)]
pub struct Match<'r> {
    pub rule_id: &'r str,
    pub fix_description: &'r str,
    /// 1-based line where the first occurrence starts
    pub line: usize,
    /// Kept for the rewriter, never rendered
    #[serde(skip)]
    pub pattern: &'r Regex,
}

impl<'r> Match<'r> {
    fn new(rule: &'r Rule, line: usize) -> Self {
        Self {
            rule_id: &rule.id,
            fix_description: &rule.suggestion,
            line,
            pattern: &rule.pattern,
        }
    }
}

impl PartialEq for Match<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.rule_id == other.rule_id
            && self.fix_description == other.fix_description
            && self.line == other.line
            && self.pattern.as_str() == other.pattern.as_str()
    }
}

/// Scans raw source against every rule of a registry.
#[derive(Debug, Clone, Copy)]
pub struct PatternMatcher<'r> {
    registry: &'r RuleRegistry,
}

impl<'r> PatternMatcher<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self { registry }
    }

    /// Every matching rule, in registry order. No rule hides another.
    pub fn match_patterns(&self, source: &str) -> Vec<Match<'r>> {
        let matches: Vec<Match<'r>> = self
            .registry
            .all_rules()
            .iter()
            .filter_map(|rule| {
                rule.pattern
                    .find(source)
                    .map(|found| Match::new(rule, line_of(source, found.start())))
            })
            .collect();

        tracing::debug!(
            rules = self.registry.len(),
            matched = matches.len(),
            "Pattern scan complete"
        );
        matches
    }
}

/// Convenience wrapper over [`PatternMatcher::match_patterns`].
pub fn match_patterns<'r>(registry: &'r RuleRegistry, source: &str) -> Vec<Match<'r>> {
    PatternMatcher::new(registry).match_patterns(source)
}

fn line_of(source: &str, byte_offset: usize) -> usize {
    source[..byte_offset].matches('\n').count() + 1
}
