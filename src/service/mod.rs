//! Entry points used by outer layers (CLI, HTTP handlers).
//!
//! [`GreenAnalyzer`] owns the rule registry, the analyzer weights and the
//! measurer, and combines the static stages into one [`InspectionReport`].

pub mod api;

use crate::analyzers::StaticCostAnalyzer;
use crate::config::{GreenmapConfig, MeasureConfig};
use crate::core::{MeasurementResult, Result, StaticReport};
use crate::measure::{refusal_reason, Measurer, PythonProcess};
use crate::patterns::{Match, PatternMatcher};
use crate::rewrite::{self, RewriteResult};
use crate::rules::RuleRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Everything the static stages know about one snippet.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport<'r> {
    /// Where the snippet came from, a path or `<stdin>`
    pub source: String,
    pub report: StaticReport,
    pub matches: Vec<Match<'r>>,
    pub rewrite: RewriteResult,
    pub generated_at: DateTime<Utc>,
    pub version: &'static str,
}

impl InspectionReport<'_> {
    pub fn has_findings(&self) -> bool {
        !self.matches.is_empty() || !self.report.suggestions.is_empty()
    }
}

pub struct GreenAnalyzer {
    registry: Arc<RuleRegistry>,
    analyzer: StaticCostAnalyzer,
    measurer: Measurer,
    measure: MeasureConfig,
}

impl GreenAnalyzer {
    /// Builtin rules plus the configured extras, with the configured sampler.
    pub fn from_config(config: &GreenmapConfig) -> Result<Self> {
        let registry = Arc::new(RuleRegistry::builtin_with(config.extra_rules())?);
        Self::with_registry(registry, config)
    }

    pub fn with_registry(registry: Arc<RuleRegistry>, config: &GreenmapConfig) -> Result<Self> {
        Ok(Self {
            registry,
            analyzer: StaticCostAnalyzer::new(config.cost.clone(), config.energy.clone()),
            measurer: Measurer::from_config(&config.energy)?,
            measure: config.measure.clone(),
        })
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn measurer(&self) -> &Measurer {
        &self.measurer
    }

    pub fn measure_config(&self) -> &MeasureConfig {
        &self.measure
    }

    pub fn analyze_static(&self, source: &str) -> StaticReport {
        self.analyzer.analyze_static(source)
    }

    pub fn match_patterns(&self, source: &str) -> Vec<Match<'_>> {
        PatternMatcher::new(&self.registry).match_patterns(source)
    }

    pub fn rewrite(&self, source: &str, matches: &[Match<'_>]) -> RewriteResult {
        rewrite::rewrite(source, matches)
    }

    /// Cost analysis, pattern scan and rewrite of one snippet.
    pub fn inspect(&self, name: impl Into<String>, source: &str) -> InspectionReport<'_> {
        let report = self.analyze_static(source);
        let matches = self.match_patterns(source);
        let rewrite = self.rewrite(source, &matches);

        InspectionReport {
            source: name.into(),
            report,
            matches,
            rewrite,
            generated_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Run `code` in the configured interpreter with the default timeout.
    pub fn measure_snippet(&self, code: &str) -> MeasurementResult {
        self.measure_snippet_with_timeout(code, self.measure.timeout_secs)
    }

    pub fn measure_snippet_with_timeout(&self, code: &str, timeout_secs: f64) -> MeasurementResult {
        if self.measure.refuse_system_imports {
            if let Some(reason) = refusal_reason(code) {
                tracing::info!("{reason}");
                return MeasurementResult::failed(reason);
            }
        }

        let process = PythonProcess::from_config(&self.measure, code);
        self.measurer.measure_secs(process, timeout_secs)
    }
}
