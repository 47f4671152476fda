//! Dynamic efficiency measurement.
//!
//! A [`Measurer`] owns one energy sampler. Each [`Measurer::measure`] call
//! holds the sampler for its whole duration, runs one workload under a
//! timeout and reports exactly one of completed, timed out or failed.

pub mod process;
pub mod sampler;
pub mod workload;

pub use process::{refusal_reason, PythonProcess};
pub use sampler::{
    joules_to_kg_co2, sampler_for, EnergySampler, EstimatedSampler, NullSampler, RaplSampler,
};
pub use workload::{ExecutionOutcome, ThreadWorkload, Workload};

use crate::config::EnergyConfig;
use crate::core::{MeasurementResult, Result};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

pub struct Measurer {
    sampler: Mutex<Box<dyn EnergySampler>>,
}

impl Measurer {
    pub fn new(sampler: Box<dyn EnergySampler>) -> Self {
        Self {
            sampler: Mutex::new(sampler),
        }
    }

    pub fn from_config(config: &EnergyConfig) -> Result<Self> {
        let sampler = sampler_for(config)?;
        tracing::debug!(sampler = sampler.name(), "Energy sampler selected");
        Ok(Self::new(sampler))
    }

    pub fn sampler_name(&self) -> &'static str {
        self.sampler.lock().name()
    }

    /// Run `workload` with a timeout given in seconds.
    ///
    /// Non-finite or non-positive timeouts are reported as `Failed`.
    pub fn measure_secs<W: Workload>(&self, workload: W, timeout_secs: f64) -> MeasurementResult {
        if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
            return MeasurementResult::failed(format!(
                "Invalid timeout: {timeout_secs} (must be a positive number of seconds)"
            ));
        }
        match Duration::try_from_secs_f64(timeout_secs) {
            Ok(timeout) => self.measure(workload, timeout),
            Err(e) => MeasurementResult::failed(format!("Invalid timeout {timeout_secs}: {e}")),
        }
    }

    pub fn measure<W: Workload>(&self, workload: W, timeout: Duration) -> MeasurementResult {
        if timeout.is_zero() {
            return MeasurementResult::failed("Invalid timeout: must be greater than zero");
        }

        let label = workload.label();
        let mut sampler = self.sampler.lock();
        let session = match SamplingSession::start(&mut **sampler) {
            Ok(session) => session,
            Err(e) => return MeasurementResult::failed(format!("Energy sampler failed to start: {e}")),
        };

        let started = Instant::now();
        let outcome = workload.execute(timeout);
        let duration_sec = started.elapsed().as_secs_f64();
        let emissions = session.finish();

        tracing::debug!(
            workload = %label,
            duration_sec,
            outcome = ?outcome,
            "Measurement finished"
        );

        match outcome {
            ExecutionOutcome::TimedOut => {
                if let Err(e) = emissions {
                    tracing::debug!("Ignoring sampler error after timeout: {e}");
                }
                MeasurementResult::Timeout {
                    timeout_sec: timeout.as_secs_f64(),
                }
            }
            ExecutionOutcome::Failed(error) => MeasurementResult::failed(error),
            ExecutionOutcome::Finished => match emissions {
                Ok(emissions_kg) => MeasurementResult::Completed {
                    duration_sec,
                    emissions_kg: emissions_kg.unwrap_or(0.0),
                },
                Err(e) => MeasurementResult::failed(format!("Energy sampler failed to stop: {e}")),
            },
            ExecutionOutcome::Raised(message) => {
                let emissions_kg = emissions.unwrap_or_else(|e| {
                    tracing::warn!("Energy sampler failed to stop: {e}");
                    None
                });
                MeasurementResult::CompletedWithError {
                    duration_sec,
                    emissions_kg: emissions_kg.unwrap_or(0.0),
                    message,
                }
            }
        }
    }
}

/// A started sampler that is stopped exactly once, on `finish` or drop.
struct SamplingSession<'s> {
    sampler: Option<&'s mut dyn EnergySampler>,
}

impl<'s> SamplingSession<'s> {
    fn start(sampler: &'s mut dyn EnergySampler) -> Result<Self> {
        sampler.start()?;
        Ok(Self {
            sampler: Some(sampler),
        })
    }

    fn finish(mut self) -> Result<Option<f64>> {
        match self.sampler.take() {
            Some(sampler) => sampler.stop(),
            None => Ok(None),
        }
    }
}

impl Drop for SamplingSession<'_> {
    fn drop(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            if let Err(e) = sampler.stop() {
                tracing::debug!("Energy sampler failed to stop during unwind: {e}");
            }
        }
    }
}
