//! Energy-aware analysis of Python snippets.
//!
//! The static pipeline estimates an operation cost from the syntax tree
//! ([`analyzers`]), matches raw text against a rule catalogue
//! ([`patterns`], [`rules`]) and proposes mechanical rewrites
//! ([`rewrite`]). The dynamic side ([`measure`]) runs snippets under a
//! timeout and samples energy. [`service::GreenAnalyzer`] ties them together.

pub mod analyzers;
pub mod benchmark;
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod measure;
pub mod patterns;
pub mod rewrite;
pub mod rules;
pub mod service;

pub use crate::analyzers::{analyze_static, StaticCostAnalyzer};
pub use crate::config::GreenmapConfig;
pub use crate::core::{Error, MeasurementResult, Result, StaticReport};
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::measure::{Measurer, PythonProcess, ThreadWorkload, Workload};
pub use crate::patterns::{match_patterns, Match, PatternMatcher};
pub use crate::rewrite::{rewrite, RewriteResult};
pub use crate::rules::{Rule, RuleRegistry, RuleSpec};
pub use crate::service::{GreenAnalyzer, InspectionReport};
