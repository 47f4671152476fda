//! Static analysis of Python snippets.

pub mod cost;
pub mod python;

pub use cost::{analyze_static, StaticCostAnalyzer};
pub use python::{parse_source, PythonAst};
