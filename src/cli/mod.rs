//! CLI module for greenmap
//!
//! - Argument parsing (`args`)
//! - Command handlers (`commands`)
//! - Runtime setup (`setup`)

pub mod args;
pub mod commands;
pub mod setup;

pub use args::{Cli, Commands, MeasureFormat};
pub use commands::{
    handle_analyze_command, handle_bench_command, handle_measure_command, handle_rules_command,
    run,
};
pub use setup::{filter_for_verbosity, init_logging, resolve_config};

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    args::parse_args()
}
