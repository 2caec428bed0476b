//! Tracing subscriber setup.

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a full `EnvFilter` directive.
pub(crate) const LOG_ENV: &str = "BARVAULT_LOG";

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Maps `-v` occurrences to a default level.
pub(crate) const fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. Logs go to stderr.
pub(crate) fn init_tracing(verbose: u8, format: LogFormat) -> Result<()> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| level_for(verbose).to_string());
    let env_filter =
        EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter: {filter}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(7), "trace");
    }
}
