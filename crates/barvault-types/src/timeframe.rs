//! Timeframe registry.
//!
//! Every supported timeframe is a variant of [`Timeframe`]; its provider
//! resolution code and bucket size live in a [`TimeframeSpec`] resolved at
//! compile time, so an unregistered timeframe cannot be represented.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::UnknownTimeframe;

/// Number of bars a bucket-derived fetch window is sized to hold.
pub const BARS_PER_WINDOW: u64 = 10_000;

/// Bar timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1-minute bars.
    #[serde(rename = "M1")]
    Minute1,
    /// 5-minute bars.
    #[serde(rename = "M5")]
    Minute5,
    /// 15-minute bars.
    #[serde(rename = "M15")]
    Minute15,
    /// 30-minute bars.
    #[serde(rename = "M30")]
    Minute30,
    /// 1-hour bars.
    #[serde(rename = "H1")]
    Hour1,
    /// 4-hour bars.
    #[serde(rename = "H4")]
    Hour4,
    /// Daily bars.
    #[serde(rename = "D1")]
    Day1,
    /// Weekly bars.
    #[serde(rename = "W1")]
    Week1,
    /// Monthly bars.
    #[serde(rename = "MN1")]
    Month1,
}

/// Opaque resolution handle understood by the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolutionCode(&'static str);

impl ResolutionCode {
    /// Returns the code as sent to the provider.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ResolutionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Registry entry for a timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeframeSpec {
    /// The timeframe this entry describes.
    pub timeframe: Timeframe,
    /// Code passed to the provider when requesting bars.
    pub resolution_code: ResolutionCode,
    /// Duration of one bar in seconds.
    pub bucket_seconds: u64,
}

impl TimeframeSpec {
    /// Width of a fetch window sized to hold [`BARS_PER_WINDOW`] bars.
    #[must_use]
    pub const fn default_window_seconds(&self) -> u64 {
        self.bucket_seconds * BARS_PER_WINDOW
    }
}

impl Timeframe {
    /// Returns the registry entry for this timeframe.
    #[must_use]
    pub const fn spec(&self) -> TimeframeSpec {
        let (code, bucket_seconds) = match self {
            Self::Minute1 => ("M1", 60),
            Self::Minute5 => ("M5", 300),
            Self::Minute15 => ("M15", 900),
            Self::Minute30 => ("M30", 1_800),
            Self::Hour1 => ("H1", 3_600),
            Self::Hour4 => ("H4", 14_400),
            Self::Day1 => ("D1", 86_400),
            Self::Week1 => ("W1", 604_800),
            // Calendar months vary; 30 days is only used to size windows.
            Self::Month1 => ("MN1", 2_592_000),
        };
        TimeframeSpec {
            timeframe: *self,
            resolution_code: ResolutionCode(code),
            bucket_seconds,
        }
    }

    /// Returns the provider resolution code.
    #[must_use]
    pub const fn resolution_code(&self) -> ResolutionCode {
        self.spec().resolution_code
    }

    /// Returns the bar duration in seconds.
    #[must_use]
    pub const fn seconds(&self) -> u64 {
        self.spec().bucket_seconds
    }

    /// Returns the registry key, also used for directory and file names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "M1",
            Self::Minute5 => "M5",
            Self::Minute15 => "M15",
            Self::Minute30 => "M30",
            Self::Hour1 => "H1",
            Self::Hour4 => "H4",
            Self::Day1 => "D1",
            Self::Week1 => "W1",
            Self::Month1 => "MN1",
        }
    }

    /// Returns all registered timeframes, shortest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minute1,
            Self::Minute5,
            Self::Minute15,
            Self::Minute30,
            Self::Hour1,
            Self::Hour4,
            Self::Day1,
            Self::Week1,
            Self::Month1,
        ]
    }
}

/// Resolves a timeframe key to its registry entry.
///
/// # Errors
///
/// Returns [`UnknownTimeframe`] if the key is not registered.
pub fn resolve(key: &str) -> Result<TimeframeSpec, UnknownTimeframe> {
    key.parse::<Timeframe>().map(|tf| tf.spec())
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m1" | "1m" | "1min" | "minute" => Ok(Self::Minute1),
            "m5" | "5m" | "5min" => Ok(Self::Minute5),
            "m15" | "15m" | "15min" => Ok(Self::Minute15),
            "m30" | "30m" | "30min" => Ok(Self::Minute30),
            "h1" | "1h" | "hour" => Ok(Self::Hour1),
            "h4" | "4h" => Ok(Self::Hour4),
            "d1" | "1d" | "day" | "daily" => Ok(Self::Day1),
            "w1" | "1w" | "week" | "weekly" => Ok(Self::Week1),
            "mn1" | "1mo" | "month" | "monthly" => Ok(Self::Month1),
            _ => Err(UnknownTimeframe(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_seconds() {
        assert_eq!(Timeframe::Minute1.seconds(), 60);
        assert_eq!(Timeframe::Hour1.seconds(), 3600);
        assert_eq!(Timeframe::Day1.seconds(), 86400);
        assert_eq!(Timeframe::Week1.seconds(), 7 * 86400);
    }

    #[test]
    fn test_timeframe_parse() {
        assert_eq!("M1".parse::<Timeframe>().unwrap(), Timeframe::Minute1);
        assert_eq!("1h".parse::<Timeframe>().unwrap(), Timeframe::Hour1);
        assert_eq!("mn1".parse::<Timeframe>().unwrap(), Timeframe::Month1);
        assert!("tick".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_resolve_unknown() {
        let err = resolve("M2").unwrap_err();
        assert_eq!(err, UnknownTimeframe("M2".to_string()));
        assert!(err.to_string().contains("M2"));
    }

    #[test]
    fn test_resolve_known() {
        let spec = resolve("h4").unwrap();
        assert_eq!(spec.timeframe, Timeframe::Hour4);
        assert_eq!(spec.resolution_code.as_str(), "H4");
        assert_eq!(spec.bucket_seconds, 14_400);
        assert_eq!(spec.default_window_seconds(), 14_400 * BARS_PER_WINDOW);
    }

    #[test]
    fn test_keys_round_trip_through_registry() {
        for tf in Timeframe::all() {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), *tf);
            assert_eq!(tf.spec().timeframe, *tf);
        }
    }
}
