//! Weighted operation-cost estimate over a Python syntax tree.
//!
//! Every named node is visited once. Loops, calls and list comprehensions
//! add a fixed weight; the total is converted into an energy estimate, a CO2
//! estimate and a 30-100 efficiency score. Each loop also gets a secondary
//! walk over its own subtree to spot nesting, which makes deeply nested
//! bodies quadratic. Inputs are snippets, not files.

use super::python::{named_descendants, parse_source};
use crate::config::{CostConfig, EnergyConfig};
use crate::core::{Error, StaticReport};
use std::collections::BTreeSet;
use tree_sitter::Node;

pub const LOOP_SUGGESTION: &str =
    "Consider minimizing loops or using vectorized operations (e.g., NumPy)";
pub const RANGE_LEN_SUGGESTION: &str = "Use direct iteration instead of range(len(x))";
pub const NESTED_LOOP_SUGGESTION: &str =
    "Detected nested loops. This can exponentially increase energy consumption.";

const LOOP_KINDS: &[&str] = &["for_statement", "while_statement"];

/// Static cost analyzer with its weights and conversion constants.
#[derive(Debug, Clone, Default)]
pub struct StaticCostAnalyzer {
    cost: CostConfig,
    energy: EnergyConfig,
}

#[derive(Debug, Default)]
struct CostTally {
    units: u64,
    suggestions: BTreeSet<String>,
}

impl CostTally {
    fn add(&mut self, weight: u64) {
        self.units = self.units.saturating_add(weight);
    }

    fn suggest(&mut self, suggestion: &str) {
        if !self.suggestions.contains(suggestion) {
            self.suggestions.insert(suggestion.to_string());
        }
    }
}

impl StaticCostAnalyzer {
    pub fn new(cost: CostConfig, energy: EnergyConfig) -> Self {
        Self { cost, energy }
    }

    /// Estimate the cost of `source`. Never fails: unparsable input yields a
    /// zero-score report carrying the syntax error.
    pub fn analyze_static(&self, source: &str) -> StaticReport {
        let ast = match parse_source(source) {
            Ok(ast) => ast,
            Err(e) => {
                tracing::debug!(error = %e, "Snippet failed to parse");
                return StaticReport::syntax_error(describe_parse_error(&e));
            }
        };

        let mut tally = CostTally::default();
        let root = ast.root();
        let mut cursor = root.walk();

        for node in named_descendants(root, &mut cursor) {
            match node.kind() {
                kind if LOOP_KINDS.contains(&kind) => {
                    tally.add(self.cost.loop_weight);
                    tally.suggest(LOOP_SUGGESTION);
                    if contains_nested_loop(node) {
                        tally.suggest(NESTED_LOOP_SUGGESTION);
                    }
                }
                "call" => {
                    tally.add(self.cost.call_weight);
                    if is_range_len_call(node, &ast.source) {
                        tally.suggest(RANGE_LEN_SUGGESTION);
                    }
                }
                "list_comprehension" => tally.add(self.cost.comprehension_weight),
                _ => {}
            }
        }

        let report = self.report(tally);
        tracing::debug!(
            operations = report.operations,
            score = report.score,
            energy_wh = report.energy_wh,
            "Static analysis complete"
        );
        report
    }

    fn report(&self, tally: CostTally) -> StaticReport {
        let energy_wh = round_to(tally.units as f64 * self.energy.wh_per_operation, 4);
        let co2_grams = round_to(energy_wh * self.energy.co2_grams_per_wh, 4);

        StaticReport {
            energy_wh,
            co2_grams,
            score: self.score(tally.units),
            operations: tally.units,
            suggestions: tally.suggestions,
            error: None,
        }
    }

    /// `max(100 - floor(units / units_per_point), floor)`.
    pub fn score(&self, units: u64) -> u32 {
        let penalty = units / self.cost.units_per_point.max(1);
        let score = 100u64.saturating_sub(penalty);
        score.max(u64::from(self.cost.score_floor)).min(100) as u32
    }
}

/// Analyze with the default weights and constants.
pub fn analyze_static(source: &str) -> StaticReport {
    StaticCostAnalyzer::default().analyze_static(source)
}

fn describe_parse_error(error: &Error) -> String {
    match error {
        Error::Parse {
            line,
            column,
            message,
        } if *line > 0 => format!("{message} (line {line}, column {column})"),
        other => other.to_string(),
    }
}

fn is_loop(node: &Node) -> bool {
    LOOP_KINDS.contains(&node.kind())
}

fn contains_nested_loop(loop_node: Node) -> bool {
    let mut cursor = loop_node.walk();
    let nested =
        named_descendants(loop_node, &mut cursor).any(|child| child != loop_node && is_loop(&child));
    nested
}

/// `range(len(...))` with exactly one positional argument.
fn is_range_len_call(call: Node, source: &str) -> bool {
    if !is_call_to(call, "range", source) {
        return false;
    }

    let Some(arguments) = call.child_by_field_name("arguments") else {
        return false;
    };
    if arguments.kind() != "argument_list" {
        return false;
    }

    let mut cursor = arguments.walk();
    let positional: Vec<Node> = arguments
        .named_children(&mut cursor)
        .filter(|arg| {
            !matches!(
                arg.kind(),
                "keyword_argument" | "dictionary_splat" | "comment"
            )
        })
        .collect();

    match positional.as_slice() {
        [only] => {
            let inner = unwrap_parens(*only);
            inner.kind() == "call" && is_call_to(inner, "len", source)
        }
        _ => false,
    }
}

fn is_call_to(call: Node, name: &str, source: &str) -> bool {
    call.child_by_field_name("function")
        .map(unwrap_parens)
        .is_some_and(|function| {
            function.kind() == "identifier" && &source[function.byte_range()] == name
        })
}

fn unwrap_parens(mut node: Node) -> Node {
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
