//! Energy samplers backing dynamic measurement.
//!
//! A sampler is started right before a workload runs and stopped right
//! after; `stop` reports the emissions (kg CO2) attributed to that window,
//! or `None` when the backend has nothing to report.

use crate::config::{EnergyConfig, SamplerKind};
use crate::core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Default location of the Linux powercap tree.
pub const POWERCAP_ROOT: &str = "/sys/class/powercap";

const JOULES_PER_KWH: f64 = 3.6e6;

pub trait EnergySampler: Send {
    fn name(&self) -> &'static str;

    fn start(&mut self) -> Result<()>;

    /// Emissions in kg CO2 since `start`.
    fn stop(&mut self) -> Result<Option<f64>>;
}

/// Convert an energy amount into kg CO2 with a kg/kWh carbon intensity.
pub fn joules_to_kg_co2(joules: f64, kg_per_kwh: f64) -> f64 {
    joules / JOULES_PER_KWH * kg_per_kwh
}

/// Reports nothing; emissions come out as zero.
#[derive(Debug, Default)]
pub struct NullSampler;

impl EnergySampler for NullSampler {
    fn name(&self) -> &'static str {
        "none"
    }

    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<Option<f64>> {
        Ok(None)
    }
}

/// Fixed power draw times wall-clock time.
#[derive(Debug)]
pub struct EstimatedSampler {
    watts: f64,
    kg_per_kwh: f64,
    started: Option<Instant>,
}

impl EstimatedSampler {
    pub fn new(watts: f64, kg_per_kwh: f64) -> Self {
        Self {
            watts,
            kg_per_kwh,
            started: None,
        }
    }
}

impl EnergySampler for EstimatedSampler {
    fn name(&self) -> &'static str {
        "estimated"
    }

    fn start(&mut self) -> Result<()> {
        self.started = Some(Instant::now());
        Ok(())
    }

    fn stop(&mut self) -> Result<Option<f64>> {
        let started = self
            .started
            .take()
            .ok_or_else(|| Error::Measurement("sampler was not started".into()))?;
        let joules = started.elapsed().as_secs_f64() * self.watts;
        Ok(Some(joules_to_kg_co2(joules, self.kg_per_kwh)))
    }
}

#[derive(Debug, Clone)]
struct RaplZone {
    energy_path: PathBuf,
    max_range_uj: u64,
}

impl RaplZone {
    fn read(&self) -> Result<u64> {
        read_counter(&self.energy_path)
    }

    /// Microjoules between two readings, allowing for one counter wrap.
    fn delta(&self, start: u64, end: u64) -> u64 {
        if end >= start {
            end - start
        } else {
            self.max_range_uj.saturating_sub(start) + end
        }
    }
}

/// Package energy counters from Linux RAPL (powercap).
#[derive(Debug)]
pub struct RaplSampler {
    zones: Vec<RaplZone>,
    kg_per_kwh: f64,
    start_readings: Option<Vec<u64>>,
}

impl RaplSampler {
    /// Find readable top-level `intel-rapl:N` zones under `root`.
    /// Subzones are skipped so package energy is not counted twice.
    pub fn discover(root: &Path, kg_per_kwh: f64) -> Result<Self> {
        let entries = fs::read_dir(root).map_err(|e| {
            Error::Measurement(format!("RAPL unavailable at {}: {e}", root.display()))
        })?;

        let mut zones: Vec<RaplZone> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_package_zone(path))
            .filter_map(|path| {
                let energy_path = path.join("energy_uj");
                read_counter(&energy_path).ok()?;
                let max_range_uj = read_counter(&path.join("max_energy_range_uj")).unwrap_or(u64::MAX);
                Some(RaplZone {
                    energy_path,
                    max_range_uj,
                })
            })
            .collect();
        zones.sort_by(|a, b| a.energy_path.cmp(&b.energy_path));

        if zones.is_empty() {
            return Err(Error::Measurement(format!(
                "No readable RAPL package zones under {}",
                root.display()
            )));
        }

        tracing::debug!(zones = zones.len(), "Using RAPL energy counters");
        Ok(Self {
            zones,
            kg_per_kwh,
            start_readings: None,
        })
    }
}

fn is_package_zone(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_prefix("intel-rapl:"))
        .is_some_and(|index| !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()))
}

fn read_counter(path: &Path) -> Result<u64> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Measurement(format!("Failed to read {}: {e}", path.display())))?;
    raw.trim().parse().map_err(|e| {
        Error::Measurement(format!("Malformed counter in {}: {e}", path.display()))
    })
}

impl EnergySampler for RaplSampler {
    fn name(&self) -> &'static str {
        "rapl"
    }

    fn start(&mut self) -> Result<()> {
        let readings = self
            .zones
            .iter()
            .map(RaplZone::read)
            .collect::<Result<Vec<_>>>()?;
        self.start_readings = Some(readings);
        Ok(())
    }

    fn stop(&mut self) -> Result<Option<f64>> {
        let start = self
            .start_readings
            .take()
            .ok_or_else(|| Error::Measurement("sampler was not started".into()))?;

        let mut microjoules: u64 = 0;
        for (zone, begin) in self.zones.iter().zip(start) {
            microjoules = microjoules.saturating_add(zone.delta(begin, zone.read()?));
        }

        let joules = microjoules as f64 / 1e6;
        Ok(Some(joules_to_kg_co2(joules, self.kg_per_kwh)))
    }
}

/// Build the sampler selected by `config`.
///
/// `auto` prefers RAPL and falls back to the power estimate; asking for
/// `rapl` explicitly fails when the counters cannot be read.
pub fn sampler_for(config: &EnergyConfig) -> Result<Box<dyn EnergySampler>> {
    let kg_per_kwh = config.carbon_intensity_kg_per_kwh;
    let sampler: Box<dyn EnergySampler> = match config.sampler {
        SamplerKind::None => Box::new(NullSampler),
        SamplerKind::Estimated => Box::new(EstimatedSampler::new(config.cpu_power_watts, kg_per_kwh)),
        SamplerKind::Rapl => Box::new(RaplSampler::discover(Path::new(POWERCAP_ROOT), kg_per_kwh)?),
        SamplerKind::Auto => match RaplSampler::discover(Path::new(POWERCAP_ROOT), kg_per_kwh) {
            Ok(rapl) => Box::new(rapl),
            Err(e) => {
                tracing::debug!("{e}; estimating energy from configured CPU power");
                Box::new(EstimatedSampler::new(config.cpu_power_watts, kg_per_kwh))
            }
        },
    };
    Ok(sampler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_zone(root: &Path, name: &str, energy: u64, max: u64) -> PathBuf {
        let zone = root.join(name);
        fs::create_dir_all(&zone).unwrap();
        fs::write(zone.join("energy_uj"), format!("{energy}\n")).unwrap();
        fs::write(zone.join("max_energy_range_uj"), format!("{max}\n")).unwrap();
        zone
    }

    #[test]
    fn test_joules_to_kg_co2() {
        // 3.6 MJ is one kWh
        assert!((joules_to_kg_co2(3.6e6, 0.475) - 0.475).abs() < 1e-12);
        assert_eq!(joules_to_kg_co2(0.0, 0.475), 0.0);
    }

    #[test]
    fn test_null_sampler_reports_nothing() {
        let mut sampler = NullSampler;
        sampler.start().unwrap();
        assert_eq!(sampler.stop().unwrap(), None);
    }

    #[test]
    fn test_estimated_sampler_requires_start() {
        let mut sampler = EstimatedSampler::new(15.0, 0.475);
        assert!(sampler.stop().is_err());

        sampler.start().unwrap();
        let kg = sampler.stop().unwrap().unwrap();
        assert!(kg >= 0.0);
    }

    #[test]
    fn test_rapl_discovers_package_zones_only() {
        let temp = TempDir::new().unwrap();
        fake_zone(temp.path(), "intel-rapl:0", 1_000, 10_000);
        fake_zone(temp.path(), "intel-rapl:0:0", 500, 10_000);
        fake_zone(temp.path(), "intel-rapl:1", 2_000, 10_000);

        let sampler = RaplSampler::discover(temp.path(), 0.475).unwrap();
        assert_eq!(sampler.zones.len(), 2);
    }

    #[test]
    fn test_rapl_delta_handles_wraparound() {
        let temp = TempDir::new().unwrap();
        let zone_dir = fake_zone(temp.path(), "intel-rapl:0", 9_000, 10_000);

        let mut sampler = RaplSampler::discover(temp.path(), 0.475).unwrap();
        sampler.start().unwrap();
        fs::write(zone_dir.join("energy_uj"), "1000\n").unwrap();

        let kg = sampler.stop().unwrap().unwrap();
        // 2000 uJ consumed across the wrap
        let expected = joules_to_kg_co2(0.002, 0.475);
        assert!((kg - expected).abs() < 1e-18);
    }

    #[test]
    fn test_rapl_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(RaplSampler::discover(&temp.path().join("absent"), 0.475).is_err());
        assert!(RaplSampler::discover(temp.path(), 0.475).is_err());
    }

    #[test]
    fn test_sampler_for_kinds() {
        let mut config = EnergyConfig {
            sampler: SamplerKind::None,
            ..EnergyConfig::default()
        };
        assert_eq!(sampler_for(&config).unwrap().name(), "none");

        config.sampler = SamplerKind::Estimated;
        assert_eq!(sampler_for(&config).unwrap().name(), "estimated");

        config.sampler = SamplerKind::Auto;
        let name = sampler_for(&config).unwrap().name();
        assert!(name == "rapl" || name == "estimated");
    }
}
