//! Result types produced by static analysis and dynamic measurement.

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Suggestion emitted when the snippet cannot be parsed.
pub const FIX_SYNTAX_SUGGESTION: &str = "Please fix syntax errors before analysis";

/// Error string reported for a measurement that ran past its budget.
pub const TIMEOUT_ERROR: &str = "Timeout";

/// Outcome of a static cost analysis.
///
/// `score` is in `[floor, 100]` for parsable input and exactly `0` when
/// `error` is set. Suggestions are a set, so repeated findings collapse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticReport {
    pub energy_wh: f64,
    pub co2_grams: f64,
    pub score: u32,
    /// Accumulated operation weight behind the estimate
    pub operations: u64,
    pub suggestions: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StaticReport {
    /// Zero-score report for a snippet that failed to parse.
    pub fn syntax_error(detail: impl AsRef<str>) -> Self {
        Self {
            energy_wh: 0.0,
            co2_grams: 0.0,
            score: 0,
            operations: 0,
            suggestions: BTreeSet::from([FIX_SYNTAX_SUGGESTION.to_string()]),
            error: Some(format!("Syntax error in code: {}", detail.as_ref())),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of one dynamic measurement.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementResult {
    /// The workload finished within its budget.
    Completed { duration_sec: f64, emissions_kg: f64 },
    /// The workload finished within its budget but raised an error.
    CompletedWithError {
        duration_sec: f64,
        emissions_kg: f64,
        message: String,
    },
    /// The budget expired before the workload finished.
    Timeout { timeout_sec: f64 },
    /// The measuring machinery itself failed.
    Failed { error: String },
}

impl MeasurementResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn duration_sec(&self) -> Option<f64> {
        match self {
            Self::Completed { duration_sec, .. } | Self::CompletedWithError { duration_sec, .. } => {
                Some(*duration_sec)
            }
            Self::Timeout { .. } | Self::Failed { .. } => None,
        }
    }

    /// Sampled emissions in kg, `0.0` when nothing was sampled.
    pub fn emissions_kg(&self) -> f64 {
        match self {
            Self::Completed { emissions_kg, .. }
            | Self::CompletedWithError { emissions_kg, .. } => *emissions_kg,
            Self::Timeout { .. } | Self::Failed { .. } => 0.0,
        }
    }

    /// Error string for outcomes that produced no measurement.
    pub fn error(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Timeout { .. } => Some(Cow::Borrowed(TIMEOUT_ERROR)),
            Self::Failed { error } => Some(Cow::Borrowed(error.as_str())),
            Self::Completed { .. } | Self::CompletedWithError { .. } => None,
        }
    }

    /// Message raised by the measured code, if any.
    pub fn execution_error(&self) -> Option<&str> {
        match self {
            Self::CompletedWithError { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::CompletedWithError { .. } => "completed_with_error",
            Self::Timeout { .. } => "timeout",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Serialize)]
struct MeasurementWire<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emissions_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Cow<'a, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution_error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_sec: Option<f64>,
}

impl Serialize for MeasurementResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let completed = self.duration_sec().is_some();
        MeasurementWire {
            status: self.status(),
            duration_sec: self.duration_sec(),
            emissions_kg: completed.then(|| self.emissions_kg()),
            error: self.error(),
            execution_error: self.execution_error(),
            timeout_sec: match self {
                Self::Timeout { timeout_sec } => Some(*timeout_sec),
                _ => None,
            },
        }
        .serialize(serializer)
    }
}
