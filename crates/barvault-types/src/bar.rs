//! OHLC bar data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One time bucket of trading activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time (start of the bucket, second resolution).
    pub timestamp: DateTime<Utc>,
    /// Opening price.
    pub open: f64,
    /// Highest price during the bucket.
    pub high: f64,
    /// Lowest price during the bucket.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Number of price changes during the bucket.
    pub tick_volume: u64,
    /// Spread in points.
    pub spread: u64,
    /// Exchange-reported traded volume.
    pub real_volume: u64,
}

impl Bar {
    /// Creates a bar with zero volumes and spread.
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            tick_volume: 0,
            spread: 0,
            real_volume: 0,
        }
    }

    /// Sets tick volume, spread and real volume.
    #[must_use]
    pub const fn with_volumes(mut self, tick_volume: u64, spread: u64, real_volume: u64) -> Self {
        self.tick_volume = tick_volume;
        self.spread = spread;
        self.real_volume = real_volume;
        self
    }

    /// Returns true if the prices describe a well-formed bar.
    ///
    /// All prices must be finite, `low` must not exceed `high`, and both
    /// `open` and `close` must lie inside `[low, high]`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite())
            && self.low <= self.high
            && (self.low..=self.high).contains(&self.open)
            && (self.low..=self.high).contains(&self.close)
    }
}
