//! Log output for the CLI.
//!
//! The library crates log through the `log` facade. The subscriber installed
//! here picks those records up through its `log` bridge and writes them to
//! stderr.

use anyhow::anyhow;
use tracing_subscriber::filter::LevelFilter;

/// Install the stderr subscriber. Fails if one is already installed.
pub fn init(level: LevelFilter) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))
}

/// Parse a level name ("warn", "DEBUG", "off", ...).
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}
