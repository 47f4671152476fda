//! Configuration for analysis weights, energy constants and measurement.
//!
//! Settings come from `.greenmap.toml`, found by walking up from the working
//! directory, or from a file named on the command line. Every field has a
//! default, so a partial file only overrides what it mentions.

mod core;
mod loader;

pub use self::core::{
    CostConfig, EnergyConfig, GreenmapConfig, MeasureConfig, RuleConfig, SamplerKind,
};
pub use self::loader::{
    directory_ancestors, discover_config, load_config, load_config_from,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
