//! Immutable catalogue of dirty-code detection rules.
//!
//! A [`RuleRegistry`] is built once (from the builtin catalogue, optionally
//! followed by rules declared in configuration) and then only read. There is
//! no way to add or remove a rule from a constructed registry; callers share
//! it behind an `Arc`.
//!
//! Rules are text patterns over the raw source, independent of the parser's
//! grammar, so a snippet that does not even parse can still be matched.

pub mod catalogue;

use crate::core::{Error, Result};
use regex::Regex;
use std::collections::HashSet;

pub use catalogue::{BUILTIN_RULES, GEN_EXP};

/// Declarative, uncompiled form of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSpec<'a> {
    pub id: &'a str,
    pub pattern: &'a str,
    pub suggestion: &'a str,
}

impl<'a> RuleSpec<'a> {
    pub const fn new(id: &'a str, pattern: &'a str, suggestion: &'a str) -> Self {
        Self {
            id,
            pattern,
            suggestion,
        }
    }
}

/// A compiled detection rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub pattern: Regex,
    pub suggestion: String,
}

impl Rule {
    pub fn compile(spec: RuleSpec<'_>) -> Result<Self> {
        let pattern = Regex::new(spec.pattern).map_err(|source| Error::InvalidRule {
            id: spec.id.to_string(),
            source,
        })?;

        Ok(Self {
            id: spec.id.to_string(),
            pattern,
            suggestion: spec.suggestion.to_string(),
        })
    }
}

/// Ordered, immutable set of rules with unique ids.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    /// Registry holding the twenty builtin rules.
    pub fn builtin() -> Result<Self> {
        Self::from_specs(BUILTIN_RULES.iter().copied())
    }

    /// Builtin rules followed by `extra`, in that order.
    pub fn builtin_with<'a>(extra: impl IntoIterator<Item = RuleSpec<'a>>) -> Result<Self> {
        Self::from_specs(BUILTIN_RULES.iter().copied().chain(extra))
    }

    /// Compile `specs` in order. Fails on the first invalid pattern or
    /// repeated id.
    pub fn from_specs<'a>(specs: impl IntoIterator<Item = RuleSpec<'a>>) -> Result<Self> {
        let mut seen = HashSet::new();
        let rules = specs
            .into_iter()
            .map(|spec| {
                if !seen.insert(spec.id.to_string()) {
                    return Err(Error::DuplicateRule(spec.id.to_string()));
                }
                Rule::compile(spec)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(rules = rules.len(), "Rule registry compiled");
        Ok(Self { rules })
    }

    /// All rules in registry order.
    pub fn all_rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_registry_has_twenty_rules_in_order() {
        let registry = RuleRegistry::builtin().unwrap();
        let ids: Vec<&str> = registry.all_rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "gen_exp",
                "str_concat",
                "set_lookup",
                "file_stream",
                "nested_loops",
                "busy_wait",
                "map_filt",
                "global_ref",
                "df_iter",
                "len_cache",
                "enum_opt",
                "dict_keys",
                "string_io",
                "tuple_swap",
                "imp_loop",
                "while_one",
                "list_ext",
                "try_loop",
                "pow_opt",
                "gc_man",
            ]
        );
    }

    #[test]
    fn test_builtin_with_appends_after_builtins() {
        let registry = RuleRegistry::builtin_with([RuleSpec::new(
            "sleep_poll",
            r"time\.sleep\(0\)",
            "Block on an event instead of polling",
        )])
        .unwrap();
        assert_eq!(registry.len(), 21);
        assert_eq!(registry.all_rules()[20].id, "sleep_poll");
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let err = RuleRegistry::builtin_with([RuleSpec::new("gen_exp", "x", "y")]).unwrap_err();
        assert!(matches!(err, Error::DuplicateRule(id) if id == "gen_exp"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = RuleRegistry::from_specs([RuleSpec::new("broken", "sum(", "n/a")]).unwrap_err();
        assert!(matches!(err, Error::InvalidRule { ref id, .. } if id == "broken"));
    }

    #[test]
    fn test_get_by_id() {
        let registry = RuleRegistry::builtin().unwrap();
        let rule = registry.get("while_one").unwrap();
        assert_eq!(rule.suggestion, "Use 'while True'");
        assert!(registry.get("missing").is_none());
    }
}
