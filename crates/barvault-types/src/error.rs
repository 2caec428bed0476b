//! Error types for barvault keys and the timeframe registry.

use thiserror::Error;

/// Returned when a timeframe key is not part of the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "unknown timeframe '{0}', expected one of: M1, M5, M15, M30, H1, H4, D1, W1, MN1"
)]
pub struct UnknownTimeframe(pub String);

/// Errors that can occur while building a [`SeriesKey`](crate::SeriesKey).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesKeyError {
    /// The timeframe key is not registered.
    #[error(transparent)]
    Timeframe(#[from] UnknownTimeframe),

    /// The symbol cannot be used to name archive files.
    #[error("invalid symbol '{symbol}': {reason}")]
    InvalidSymbol {
        /// The rejected symbol.
        symbol: String,
        /// Why the symbol was rejected.
        reason: &'static str,
    },
}
