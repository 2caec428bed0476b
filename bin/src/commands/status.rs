//! Status command implementation.

use crate::commands::stored_keys;
use crate::config::FileConfig;
use crate::display::{format_time, parse_timeframes};
use anyhow::{Result, bail};
use barvault_lib::MirrorState;
use std::path::PathBuf;

/// Show a summary of every stored series matching the filters.
pub(crate) fn status(
    settings: &FileConfig,
    data_dir: Option<PathBuf>,
    symbols: &[String],
    timeframes: &[String],
) -> Result<()> {
    let store = settings.store(data_dir)?;
    let timeframes = parse_timeframes(timeframes)?;
    let keys = stored_keys(&store, symbols, &timeframes)?;

    if keys.is_empty() {
        println!("No series found in {}.", store.root().display());
        return Ok(());
    }

    println!(
        "{:<20} {:>10} {:<17} {:<17} {:<10}",
        "SERIES", "BARS", "FIRST", "LAST", "MIRROR"
    );
    println!("{}", "-".repeat(78));

    let mut errors = 0usize;
    let mut stale = 0usize;
    for key in &keys {
        match store.summary(key) {
            Ok(Some(summary)) => {
                if summary.mirror != MirrorState::Consistent {
                    stale += 1;
                }
                println!(
                    "{:<20} {:>10} {:<17} {:<17} {:<10}",
                    key.to_string(),
                    summary.bars,
                    format_time(summary.first),
                    format_time(summary.last),
                    summary.mirror.as_str()
                );
            }
            // Removed between listing and reading.
            Ok(None) => {}
            Err(e) => {
                errors += 1;
                println!("{:<20} error: {e}", key.to_string());
            }
        }
    }

    println!("\nTotal: {} series", keys.len());
    if stale > 0 {
        println!("{stale} mirror(s) out of date; run `barvault rebuild-mirror` to repair.");
    }
    if errors > 0 {
        bail!("{errors} series could not be read");
    }
    Ok(())
}
