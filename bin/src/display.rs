//! Parsing and formatting helpers for the barvault CLI.

use anyhow::{Result, bail};
use barvault_lib::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indicatif::ProgressStyle;

/// Parses a date (`YYYY-MM-DD`, midnight UTC) or an RFC 3339 timestamp.
pub(crate) fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    bail!("Invalid time: {s}. Expected YYYY-MM-DD or an RFC 3339 timestamp")
}

/// Formats an optional timestamp for tables.
pub(crate) fn format_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "-".to_string(), |ts| ts.format("%Y-%m-%d %H:%M").to_string())
}

/// Resolves `--timeframes` values, defaulting to every registered timeframe.
pub(crate) fn timeframe_keys(requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        Timeframe::all().iter().map(|tf| tf.as_str().to_string()).collect()
    } else {
        requested.iter().map(|tf| tf.trim().to_string()).collect()
    }
}

/// Parses timeframe filters for commands that only read the archive.
pub(crate) fn parse_timeframes(requested: &[String]) -> Result<Vec<Timeframe>> {
    requested
        .iter()
        .map(|key| key.parse::<Timeframe>().map_err(|e| anyhow::anyhow!("{e}")))
        .collect()
}

/// Style for the batch sync progress bar.
pub(crate) fn bar_style() -> Result<ProgressStyle> {
    Ok(
        ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    )
}
