//! Rebuild-mirror command implementation.

use crate::commands::stored_keys;
use crate::config::FileConfig;
use crate::display::parse_timeframes;
use anyhow::{Result, bail};
use std::path::PathBuf;
use tracing::warn;

/// Regenerate the Parquet mirror of every stored series matching the filters.
pub(crate) fn rebuild_mirror(
    settings: &FileConfig,
    data_dir: Option<PathBuf>,
    symbols: &[String],
    timeframes: &[String],
    quiet: bool,
) -> Result<()> {
    let store = settings.store(data_dir)?;
    let timeframes = parse_timeframes(timeframes)?;
    let keys = stored_keys(&store, symbols, &timeframes)?;

    if keys.is_empty() {
        println!("No series found in {}.", store.root().display());
        return Ok(());
    }

    let mut failures = Vec::new();
    for key in &keys {
        match store.rebuild_mirror(key) {
            Ok(Some(bars)) => {
                if !quiet {
                    println!("  {:<20} {bars} bars", key.to_string());
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(series = %key, error = %e, "mirror rebuild failed");
                failures.push((key.to_string(), e));
            }
        }
    }

    if !quiet {
        println!("\nRebuilt: {}", keys.len() - failures.len());
        for (key, err) in &failures {
            println!("  {key}: {err}");
        }
    }

    if !failures.is_empty() {
        bail!("{} out of {} mirrors failed to rebuild", failures.len(), keys.len());
    }
    Ok(())
}
