pub mod output;

pub use output::{create_writer, OutputFormat, OutputWriter};

use anyhow::{Context, Result};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Name used for snippets read from standard input.
pub const STDIN_NAME: &str = "<stdin>";

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Read a snippet from `path`, or from stdin when `path` is `None` or `-`.
pub fn read_source(path: Option<&Path>) -> Result<(String, String)> {
    match path {
        Some(path) if path != Path::new("-") => {
            Ok((path.display().to_string(), read_file(path)?))
        }
        _ => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("Failed to read snippet from stdin")?;
            Ok((STDIN_NAME.to_string(), source))
        }
    }
}
