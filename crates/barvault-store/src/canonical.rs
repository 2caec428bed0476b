//! Canonical CSV representation.
//!
//! One header row (`time,open,high,low,close,tick_volume,spread,real_volume`)
//! followed by one row per bar, with times written as ISO-8601 UTC seconds.

use barvault_types::Bar;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Write};

use crate::format::COLUMNS;
use crate::{FormatError, SeriesFormat};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    tick_volume: u64,
    spread: u64,
    real_volume: u64,
}

impl From<&Bar> for CsvRow {
    fn from(bar: &Bar) -> Self {
        Self {
            time: bar.timestamp.format(TIME_FORMAT).to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            tick_volume: bar.tick_volume,
            spread: bar.spread,
            real_volume: bar.real_volume,
        }
    }
}

impl CsvRow {
    fn into_bar(self, record: u64) -> Result<Bar, FormatError> {
        let timestamp = parse_time(&self.time).ok_or_else(|| FormatError::InvalidRecord {
            record,
            message: format!("unparseable time '{}'", self.time),
        })?;
        Ok(Bar::new(timestamp, self.open, self.high, self.low, self.close).with_volumes(
            self.tick_volume,
            self.spread,
            self.real_volume,
        ))
    }
}

/// Accepts RFC 3339 as well as the space-separated form older archives use.
fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// CSV codec for the canonical file.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormat;

impl CsvFormat {
    /// Creates a new CSV codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SeriesFormat for CsvFormat {
    fn write_bars<W: Write + Send>(&self, bars: &[Bar], writer: W) -> Result<(), FormatError> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        // Written explicitly so an empty series still carries its header.
        csv.write_record(COLUMNS)?;
        for bar in bars {
            csv.serialize(CsvRow::from(bar))?;
        }
        csv.flush()?;
        Ok(())
    }

    fn read_bars(&self, file: File) -> Result<Vec<Bar>, FormatError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let mut bars = Vec::new();
        for (idx, row) in reader.deserialize::<CsvRow>().enumerate() {
            bars.push(row?.into_bar(idx as u64 + 1)?);
        }
        Ok(bars)
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}
