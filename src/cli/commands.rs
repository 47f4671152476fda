//! Command handlers. Each handler owns its I/O; the analysis itself lives in
//! [`GreenAnalyzer`].

use super::args::{Cli, Commands, MeasureFormat};
use super::setup::resolve_config;
use crate::benchmark::{self, BenchmarkOptions, EXAMPLES};
use crate::config::GreenmapConfig;
use crate::io::{self, create_writer, OutputFormat};
use crate::rewrite::fixable_rules;
use crate::service::{GreenAnalyzer, InspectionReport};
use anyhow::{Context, Result};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const BENCH_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}";

pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            paths,
            format,
            output,
        } => handle_analyze_command(&config, &paths, format, output.as_deref()),
        Commands::Measure {
            path,
            timeout,
            python,
            format,
        } => handle_measure_command(config, path.as_deref(), timeout, python, format),
        Commands::Bench {
            output,
            timeout,
            no_progress,
        } => handle_bench_command(&config, &output, timeout, !no_progress),
        Commands::Rules => handle_rules_command(&config),
    }
}

fn open_destination(output: Option<&Path>) -> Result<Box<dyn Write>> {
    let destination: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout()),
    };
    Ok(destination)
}

fn read_sources(paths: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if paths.is_empty() {
        return Ok(vec![io::read_source(None)?]);
    }
    paths
        .iter()
        .map(|path| io::read_source(Some(path)))
        .collect()
}

pub fn handle_analyze_command(
    config: &GreenmapConfig,
    paths: &[PathBuf],
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let analyzer = GreenAnalyzer::from_config(config).context("Failed to set up analyzer")?;
    let sources = read_sources(paths)?;
    tracing::info!(snippets = sources.len(), "Analyzing");

    let reports: Vec<InspectionReport<'_>> = sources
        .par_iter()
        .map(|(name, source)| analyzer.inspect(name.as_str(), source))
        .collect();

    let mut writer = create_writer(format, open_destination(output)?);
    writer.write_inspections(&reports)?;
    Ok(())
}

pub fn handle_measure_command(
    mut config: GreenmapConfig,
    path: Option<&Path>,
    timeout: Option<f64>,
    python: Option<String>,
    format: MeasureFormat,
) -> Result<()> {
    if let Some(python) = python {
        config.measure.python = python;
    }
    let analyzer = GreenAnalyzer::from_config(&config).context("Failed to set up analyzer")?;
    let (name, source) = io::read_source(path)?;
    let timeout = timeout.unwrap_or(config.measure.timeout_secs);

    tracing::info!(
        source = %name,
        timeout,
        sampler = analyzer.measurer().sampler_name(),
        "Measuring"
    );
    let result = analyzer.measure_snippet_with_timeout(&source, timeout);

    let mut writer = create_writer(format.into(), Box::new(std::io::stdout()));
    writer.write_measurement(&name, &result)?;
    Ok(())
}

pub fn handle_bench_command(
    config: &GreenmapConfig,
    output: &Path,
    timeout: f64,
    show_progress: bool,
) -> Result<()> {
    let analyzer = GreenAnalyzer::from_config(config).context("Failed to set up analyzer")?;
    let options = BenchmarkOptions {
        timeout_secs: timeout,
        ..BenchmarkOptions::default()
    };

    let progress = if show_progress {
        let bar = ProgressBar::new(EXAMPLES.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BENCH_TEMPLATE)
                .context("Invalid progress bar template")?
                .progress_chars("█▓▒░  "),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let records = benchmark::run_benchmark(&analyzer, EXAMPLES, &options, |record| {
        progress.set_message(record.example_id.clone());
        progress.inc(1);
    })
    .context("Failed to run benchmark")?;
    progress.finish_and_clear();

    benchmark::write_csv_file(output, &records)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    eprintln!(
        "{} {} results written to {}",
        "✓".green(),
        records.len(),
        output.display()
    );
    Ok(())
}

pub fn handle_rules_command(config: &GreenmapConfig) -> Result<()> {
    let analyzer = GreenAnalyzer::from_config(config).context("Failed to set up analyzer")?;
    let fixable: Vec<&str> = fixable_rules().collect();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Id", "Pattern", "Suggestion", "Auto-fix"]);
    for rule in analyzer.registry().all_rules() {
        table.add_row(vec![
            rule.id.clone(),
            rule.pattern.as_str().to_string(),
            rule.suggestion.clone(),
            if fixable.contains(&rule.id.as_str()) {
                "yes".to_string()
            } else {
                String::new()
            },
        ]);
    }
    println!("{table}");
    Ok(())
}
