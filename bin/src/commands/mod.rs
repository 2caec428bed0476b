//! CLI command implementations.

pub(crate) mod rebuild_mirror;
pub(crate) mod status;
pub(crate) mod symbols;
pub(crate) mod sync;
pub(crate) mod timeframes;

use anyhow::{Context, Result};
use barvault_lib::prelude::*;

/// Stored series matching the symbol and timeframe filters (empty means all).
pub(crate) fn stored_keys(
    store: &SeriesStore,
    symbols: &[String],
    timeframes: &[Timeframe],
) -> Result<Vec<SeriesKey>> {
    let keys = store
        .list()
        .with_context(|| format!("Failed to scan archive at {}", store.root().display()))?;

    Ok(keys
        .into_iter()
        .filter(|key| symbols.is_empty() || symbols.iter().any(|s| s == key.symbol()))
        .filter(|key| timeframes.is_empty() || timeframes.contains(&key.timeframe()))
        .collect())
}
