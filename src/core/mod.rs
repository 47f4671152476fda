//! Core data model shared by the analysis and measurement layers.

pub mod errors;
pub mod report;

pub use errors::{Error, Result, ResultExt};
pub use report::{MeasurementResult, StaticReport, FIX_SYNTAX_SUGGESTION, TIMEOUT_ERROR};
