use crate::io::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Formats supported by `measure`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MeasureFormat {
    Terminal,
    Json,
}

impl From<MeasureFormat> for OutputFormat {
    fn from(format: MeasureFormat) -> Self {
        match format {
            MeasureFormat::Terminal => OutputFormat::Terminal,
            MeasureFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "greenmap")]
#[command(about = "Energy-aware analyzer for Python snippets", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Configuration file (defaults to the nearest .greenmap.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate cost, match wasteful patterns and propose a rewrite
    Analyze {
        /// Python files to analyze (stdin when omitted or `-`)
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a snippet under a timeout and report duration and emissions
    Measure {
        /// Python file to run (stdin when omitted or `-`)
        path: Option<PathBuf>,

        /// Timeout in seconds (defaults to measure.timeout_secs)
        #[arg(short, long)]
        timeout: Option<f64>,

        /// Python interpreter
        #[arg(long, env = "GREENMAP_PYTHON")]
        python: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: MeasureFormat,
    },

    /// Measure the builtin example catalogue and write a CSV report
    Bench {
        /// CSV file to write
        #[arg(short, long, default_value = "green_code_metrics.csv")]
        output: PathBuf,

        /// Timeout per example in seconds
        #[arg(short, long, default_value_t = crate::benchmark::DEFAULT_TIMEOUT_SECS)]
        timeout: f64,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// List the detection rules in registry order
    Rules,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
