//! Sync command.
//!
//! Fans out over every `(symbol, timeframe)` pair with bounded concurrency and
//! reports one line per pair as it finishes.

use crate::config::{DEFAULT_CONFIG_FILE, FileConfig, SyncOverrides};
use crate::display::{bar_style, parse_time, timeframe_keys};
use anyhow::{Context, Result, bail};
use barvault_lib::SyncError;
use barvault_lib::prelude::*;
use chrono::Utc;
use futures::StreamExt;
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Execute the sync command.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn sync(
    settings: &FileConfig,
    data_dir: Option<PathBuf>,
    provider_url: Option<&str>,
    symbols: Vec<String>,
    timeframes: Vec<String>,
    until: Option<&str>,
    overrides: &SyncOverrides,
    quiet: bool,
) -> Result<()> {
    let symbols = if symbols.is_empty() {
        settings.sync.symbols.clone()
    } else {
        symbols
    };
    if symbols.is_empty() {
        bail!(
            "No symbols given. Pass them as arguments or list them under [sync] in {DEFAULT_CONFIG_FILE}"
        );
    }

    let timeframes = if timeframes.is_empty() {
        timeframe_keys(&settings.sync.timeframes)
    } else {
        timeframe_keys(&timeframes)
    };

    let target_end = until.map(parse_time).transpose()?.unwrap_or_else(Utc::now);
    let sync_config = settings.sync_config(overrides)?;
    let store = settings.store(data_dir)?;
    let provider = HttpProvider::new(settings.client_config(provider_url))
        .context("Failed to create provider client")?;

    let pairs = pairs(&symbols, &timeframes);
    info!(
        pairs = pairs.len(),
        %target_end,
        root = %store.root().display(),
        "starting sync"
    );

    let synchronizer = Synchronizer::new(Arc::new(provider), store, sync_config);

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(pairs.len() as u64)
    };
    progress.set_style(bar_style()?);
    progress.set_prefix("sync");

    let mut stream = std::pin::pin!(synchronizer.sync_stream(pairs, target_end));
    let (mut updated, mut unchanged) = (0usize, 0usize);
    let mut failures = Vec::new();

    while let Some(pair) = stream.next().await {
        let label = pair.label();
        match pair.result {
            Ok(outcome) => {
                if matches!(outcome, SyncOutcome::Updated { .. }) {
                    updated += 1;
                } else {
                    unchanged += 1;
                }
                if !quiet {
                    progress.println(format!("  {label:<16} {outcome}"));
                }
            }
            Err(e) => {
                if !quiet {
                    progress.println(format!("  {label:<16} failed: {e}"));
                }
                failures.push((label.clone(), e));
            }
        }
        progress.set_message(label);
        progress.inc(1);
    }
    progress.finish_and_clear();

    if !quiet {
        println!("\nSync complete:");
        println!("  Updated: {updated}");
        println!("  Unchanged: {unchanged}");
        if !failures.is_empty() {
            println!("  Failed: {}", failures.len());
            for (label, err) in &failures {
                println!("    {label}: {}", describe(err));
            }
        }
    }

    if !failures.is_empty() {
        bail!(
            "{} out of {} series failed to sync",
            failures.len(),
            updated + unchanged + failures.len()
        );
    }

    Ok(())
}

/// Every symbol crossed with every timeframe, one pair per series, in input
/// order.
///
/// Timeframe aliases such as `M1` and `1m` name the same series. Pairs that do
/// not parse are kept so the sync reports them.
fn pairs(symbols: &[String], timeframes: &[String]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::with_capacity(symbols.len() * timeframes.len());
    for symbol in symbols {
        for timeframe in timeframes {
            let series = SeriesKey::parse(symbol, timeframe)
                .map_err(|_| (symbol.clone(), timeframe.clone()));
            if seen.insert(series) {
                pairs.push((symbol.clone(), timeframe.clone()));
            }
        }
    }
    pairs
}

/// One-line explanation with a hint for failures the user can fix.
fn describe(err: &SyncError) -> String {
    match err {
        SyncError::SymbolNotFound(symbol) => {
            format!("{err} (check `barvault symbols {symbol}`)")
        }
        SyncError::Store(e) if e.is_mirror_stale() => {
            format!("{err} (run `barvault rebuild-mirror` to repair)")
        }
        _ => err.to_string(),
    }
}
