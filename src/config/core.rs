//! Configuration types read from `.greenmap.toml`.

use crate::core::{Error, Result};
use crate::rules::RuleSpec;
use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GreenmapConfig {
    #[serde(default)]
    pub cost: CostConfig,

    #[serde(default)]
    pub energy: EnergyConfig,

    #[serde(default)]
    pub measure: MeasureConfig,

    /// Extra rules appended after the builtin catalogue
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl GreenmapConfig {
    pub fn validate(&self) -> Result<()> {
        self.cost.validate()?;
        self.energy.validate()?;
        self.measure.validate()?;
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                return Err(Error::Configuration("rule id must not be empty".into()));
            }
        }
        Ok(())
    }

    pub fn extra_rules(&self) -> impl Iterator<Item = RuleSpec<'_>> {
        self.rules.iter().map(RuleConfig::as_spec)
    }
}

/// Operation weights used by the static cost analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    /// Units added for every `for` / `while` loop
    #[serde(default = "default_loop_weight")]
    pub loop_weight: u64,

    /// Units added for every call expression
    #[serde(default = "default_call_weight")]
    pub call_weight: u64,

    /// Units added for every list comprehension
    #[serde(default = "default_comprehension_weight")]
    pub comprehension_weight: u64,

    /// Units that cost one score point
    #[serde(default = "default_units_per_point")]
    pub units_per_point: u64,

    /// Lowest score a parsable snippet can get
    #[serde(default = "default_score_floor")]
    pub score_floor: u32,
}

pub fn default_loop_weight() -> u64 {
    500
}

pub fn default_call_weight() -> u64 {
    50
}

pub fn default_comprehension_weight() -> u64 {
    200
}

pub fn default_units_per_point() -> u64 {
    50
}

pub fn default_score_floor() -> u32 {
    30
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            loop_weight: default_loop_weight(),
            call_weight: default_call_weight(),
            comprehension_weight: default_comprehension_weight(),
            units_per_point: default_units_per_point(),
            score_floor: default_score_floor(),
        }
    }
}

impl CostConfig {
    fn validate(&self) -> Result<()> {
        if self.units_per_point == 0 {
            return Err(Error::Configuration(
                "cost.units_per_point must be greater than 0".into(),
            ));
        }
        if self.score_floor > 100 {
            return Err(Error::Configuration(format!(
                "cost.score_floor must be at most 100, got {}",
                self.score_floor
            )));
        }
        Ok(())
    }
}

/// Which energy sampler backs dynamic measurement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerKind {
    /// RAPL counters when readable, otherwise the power estimate
    #[default]
    Auto,
    Rapl,
    Estimated,
    None,
}

/// Energy and carbon conversion constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Estimated Wh per operation unit
    #[serde(default = "default_wh_per_operation")]
    pub wh_per_operation: f64,

    /// Carbon intensity in g CO2 per Wh (equal to kg per kWh)
    #[serde(default = "default_co2_grams_per_wh")]
    pub co2_grams_per_wh: f64,

    /// Carbon intensity applied to measured energy, kg CO2 per kWh
    #[serde(default = "default_carbon_intensity_kg_per_kwh")]
    pub carbon_intensity_kg_per_kwh: f64,

    /// Power draw assumed by the estimating sampler
    #[serde(default = "default_cpu_power_watts")]
    pub cpu_power_watts: f64,

    #[serde(default)]
    pub sampler: SamplerKind,
}

pub fn default_wh_per_operation() -> f64 {
    0.00002
}

pub fn default_co2_grams_per_wh() -> f64 {
    0.475
}

pub fn default_carbon_intensity_kg_per_kwh() -> f64 {
    0.475
}

pub fn default_cpu_power_watts() -> f64 {
    15.0
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            wh_per_operation: default_wh_per_operation(),
            co2_grams_per_wh: default_co2_grams_per_wh(),
            carbon_intensity_kg_per_kwh: default_carbon_intensity_kg_per_kwh(),
            cpu_power_watts: default_cpu_power_watts(),
            sampler: SamplerKind::default(),
        }
    }
}

impl EnergyConfig {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("energy.wh_per_operation", self.wh_per_operation),
            ("energy.co2_grams_per_wh", self.co2_grams_per_wh),
            (
                "energy.carbon_intensity_kg_per_kwh",
                self.carbon_intensity_kg_per_kwh,
            ),
            ("energy.cpu_power_watts", self.cpu_power_watts),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Configuration(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Dynamic measurement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Interpreter used to run snippets
    #[serde(default = "default_python")]
    pub python: String,

    /// Address-space limit for the child interpreter, unlimited when absent
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: Option<u64>,

    /// Refuse snippets that import `os` or `sys`
    #[serde(default = "default_refuse_system_imports")]
    pub refuse_system_imports: bool,
}

pub fn default_timeout_secs() -> f64 {
    5.0
}

pub fn default_python() -> String {
    "python3".to_string()
}

pub fn default_memory_limit_mb() -> Option<u64> {
    Some(1024)
}

pub fn default_refuse_system_imports() -> bool {
    true
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            python: default_python(),
            memory_limit_mb: default_memory_limit_mb(),
            refuse_system_imports: default_refuse_system_imports(),
        }
    }
}

impl MeasureConfig {
    fn validate(&self) -> Result<()> {
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(Error::Configuration(format!(
                "measure.timeout_secs must be greater than 0, got {}",
                self.timeout_secs
            )));
        }
        if self.python.trim().is_empty() {
            return Err(Error::Configuration(
                "measure.python must name an interpreter".into(),
            ));
        }
        Ok(())
    }
}

/// A rule declared in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    pub pattern: String,
    pub suggestion: String,
}

impl RuleConfig {
    pub fn as_spec(&self) -> RuleSpec<'_> {
        RuleSpec::new(&self.id, &self.pattern, &self.suggestion)
    }
}
