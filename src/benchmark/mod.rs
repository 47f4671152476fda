//! Batch benchmark over a fixed catalogue of wasteful snippets.
//!
//! Every example is measured in a child interpreter, then matched against
//! the registry. One CSV row per example records the timing, the sampled
//! emissions and the first matching fix.

use crate::core::{Error, MeasurementResult, Result};
use crate::measure::PythonProcess;
use crate::service::GreenAnalyzer;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Placeholder for a duration or fix that is not available.
pub const NOT_AVAILABLE: &str = "N/A";

pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example {
    pub id: &'static str,
    pub code: &'static str,
}

const fn example(id: &'static str, code: &'static str) -> Example {
    Example { id, code }
}

pub const EXAMPLES: &[Example] = &[
    example("gen_exp", "total = sum([i*i for i in range(10000)])"),
    example("str_concat", "s = \"\"\nfor i in range(1000): s += \"a\""),
    example("set_lookup", "data = list(range(10000))\nif 9999 in data: pass"),
    example(
        "file_stream",
        "with open('test.txt', 'w') as f: f.write('lines\\n'*5000)\ndata = open('test.txt').read()",
    ),
    example(
        "nested_loops",
        "A = range(200); B = range(200)\nfor x in A:\n for y in B: pass",
    ),
    example(
        "busy_wait",
        "import time\nt_end = time.time() + 0.01\nwhile time.time() < t_end: pass",
    ),
    example("map_filter", "res = map(lambda x: x*2, range(10000))"),
    example(
        "global_vars",
        "x = 0\ndef inc():\n global x; x+=1\nfor _ in range(10000): inc()",
    ),
    example(
        "pandas_iter",
        "import pandas as pd\ndf = pd.DataFrame({'a': range(1000)})\nfor i, row in df.iterrows(): pass",
    ),
    example("len_cache", "arr = range(10000)\ni=0\nwhile i < len(arr): i+=1"),
    example(
        "enumerate_opt",
        "arr = range(10000)\nfor i in range(len(arr)): val = arr[i]",
    ),
    example("dict_keys", "d = {i:i for i in range(10000)}\nfor k in d.keys(): pass"),
    example("huge_str_io", "large = ''\nfor i in range(1000): large += str(i)"),
    example(
        "tuple_swap",
        "a=1; b=2\nfor _ in range(10000): temp=a; a=b; b=temp",
    ),
    example("import_loop", "for _ in range(1000): import math"),
    example("while_one", "i=0\nwhile 1:\n if i>10000: break\n i+=1"),
    example("list_extend", "l = []\nfor i in range(10000): l.append(i)"),
    example("try_loop", "for i in range(10000):\n try: x=1\n except: pass"),
    example("math_pow", "for i in range(10000): x = i ** 2"),
    example("manual_gc", "import gc\nfor _ in range(100): gc.disable()"),
];

/// One CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    #[serde(rename = "Example_ID")]
    pub example_id: String,
    /// Seconds, or `N/A` when the run did not complete
    #[serde(rename = "Duration_sec")]
    pub duration_sec: String,
    #[serde(rename = "Emissions_kg")]
    pub emissions_kg: f64,
    #[serde(rename = "Green_Code_Fix")]
    pub green_code_fix: String,
}

impl BenchmarkRecord {
    pub fn new(example_id: &str, measurement: &MeasurementResult, first_fix: Option<&str>) -> Self {
        Self {
            example_id: example_id.to_string(),
            duration_sec: measurement
                .duration_sec()
                .map(|secs| secs.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            emissions_kg: measurement.emissions_kg(),
            green_code_fix: first_fix.unwrap_or(NOT_AVAILABLE).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BenchmarkOptions {
    pub timeout_secs: f64,
    /// Directory the snippets run in; files they create are left there.
    /// When unset, a fresh scratch directory is used and removed afterwards.
    pub working_dir: Option<PathBuf>,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            working_dir: None,
        }
    }
}

/// Measure and match `examples` in order, reporting each finished record
/// to `on_record`.
pub fn run_benchmark<F>(
    analyzer: &GreenAnalyzer,
    examples: &[Example],
    options: &BenchmarkOptions,
    mut on_record: F,
) -> Result<Vec<BenchmarkRecord>>
where
    F: FnMut(&BenchmarkRecord),
{
    let scratch;
    let working_dir = match &options.working_dir {
        Some(dir) => dir.as_path(),
        None => {
            scratch = tempfile::Builder::new()
                .prefix("greenmap-bench-")
                .tempdir()?;
            scratch.path()
        }
    };
    tracing::debug!(dir = %working_dir.display(), "Benchmark working directory");

    let records = examples
        .iter()
        .map(|example| {
            tracing::info!(example = example.id, "Benchmarking");
            let process = PythonProcess::from_config(analyzer.measure_config(), example.code)
                .with_working_dir(working_dir);
            let measurement = analyzer.measurer().measure_secs(process, options.timeout_secs);
            if let Some(message) = measurement.execution_error() {
                tracing::warn!(example = example.id, "Snippet raised: {message}");
            }

            let matches = analyzer.match_patterns(example.code);
            let record = BenchmarkRecord::new(
                example.id,
                &measurement,
                matches.first().map(|m| m.fix_description),
            );
            on_record(&record);
            record
        })
        .collect();
    Ok(records)
}

pub fn write_csv<W: Write>(writer: W, records: &[BenchmarkRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, records: &[BenchmarkRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| Error::file_system("Failed to create benchmark report", path, e))?;
    write_csv(std::io::BufWriter::new(file), records)
}
