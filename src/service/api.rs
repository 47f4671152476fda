//! Request and response shapes of the analyze and health endpoints.

use crate::core::StaticReport;
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "Green-Code Registry Backend";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub code: String,
}

/// Flat analyze payload: `{energy, co2, score, suggestions}` plus `error`
/// when the snippet did not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub energy: f64,
    pub co2: f64,
    pub score: u32,
    pub suggestions: Vec<String>,
}

impl From<StaticReport> for AnalyzeResponse {
    fn from(report: StaticReport) -> Self {
        Self {
            error: report.error,
            energy: report.energy_wh,
            co2: report.co2_grams,
            score: report.score,
            suggestions: report.suggestions.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

pub fn health() -> HealthResponse {
    HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    }
}
