//! File codec abstraction.

use barvault_types::Bar;
use std::fs::File;
use std::io::Write;

use crate::FormatError;

/// Column names shared by both files, in order.
pub(crate) const COLUMNS: [&str; 8] = [
    "time",
    "open",
    "high",
    "low",
    "close",
    "tick_volume",
    "spread",
    "real_volume",
];

/// A persisted representation of a bar series.
pub trait SeriesFormat: Send + Sync {
    /// Writes bars in the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    fn write_bars<W: Write + Send>(&self, bars: &[Bar], writer: W) -> Result<(), FormatError>;

    /// Reads all bars in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be decoded.
    fn read_bars(&self, file: File) -> Result<Vec<Bar>, FormatError>;

    /// Returns the file extension for this format.
    fn extension(&self) -> &'static str;
}
