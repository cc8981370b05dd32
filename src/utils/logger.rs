//! Process logging
//!
//! Installs the `tracing` subscriber. The configured level (or `RUST_LOG`)
//! filters the crate's own diagnostics. The suite console echo is let through
//! at every level.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::logs::CONSOLE_TARGET;

const CRATE_TARGET: &str = "api_suite";

/// Parse a configured level name. `warning` is accepted for `warn`.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_lowercase().as_str() {
        "warning" => Some(LevelFilter::WARN),
        other => other.parse().ok(),
    }
}

/// Filter for the crate's diagnostics at `level`
pub fn default_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::new(format!("{CRATE_TARGET}={level}"))
}

/// Add the console echo target to `filter`
pub fn with_console(filter: EnvFilter) -> EnvFilter {
    match format!("{CONSOLE_TARGET}=info").parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Install the subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_logger(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    tracing_subscriber::fmt()
        .with_env_filter(with_console(filter))
        .with_target(false)
        .compact()
        .init();
}
