//! JSON payloads exchanged with the REST bridge.

use barvault_types::Bar;
use chrono::{TimeZone, Utc};
use serde::Deserialize;

use crate::ProviderError;

/// One rate row as served by the bridge (`time` in unix seconds).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RateRow {
    pub(crate) time: i64,
    pub(crate) open: f64,
    pub(crate) high: f64,
    pub(crate) low: f64,
    pub(crate) close: f64,
    #[serde(default)]
    pub(crate) tick_volume: u64,
    #[serde(default)]
    pub(crate) spread: u64,
    #[serde(default)]
    pub(crate) real_volume: u64,
}

impl RateRow {
    pub(crate) fn into_bar(self) -> Result<Bar, ProviderError> {
        let timestamp = Utc
            .timestamp_opt(self.time, 0)
            .single()
            .ok_or_else(|| ProviderError::InvalidData(format!("timestamp out of range: {}", self.time)))?;

        Ok(Bar::new(timestamp, self.open, self.high, self.low, self.close).with_volumes(
            self.tick_volume,
            self.spread,
            self.real_volume,
        ))
    }
}

/// Reply of the symbol selection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SelectReply {
    pub(crate) selected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_row_into_bar() {
        let row: RateRow = serde_json::from_str(
            r#"{"time":1704110400,"open":1.1,"high":1.2,"low":1.0,"close":1.15,
                "tick_volume":42,"spread":3,"real_volume":7}"#,
        )
        .unwrap();
        let bar = row.into_bar().unwrap();

        assert_eq!(bar.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        assert_eq!(bar.tick_volume, 42);
        assert_eq!(bar.spread, 3);
        assert_eq!(bar.real_volume, 7);
        assert!((bar.close - 1.15).abs() < 1e-12);
    }

    #[test]
    fn test_rate_row_volumes_default_to_zero() {
        let row: RateRow =
            serde_json::from_str(r#"{"time":0,"open":1,"high":1,"low":1,"close":1}"#).unwrap();
        let bar = row.into_bar().unwrap();
        assert_eq!((bar.tick_volume, bar.spread, bar.real_volume), (0, 0, 0));
    }

    #[test]
    fn test_rate_row_rejects_out_of_range_time() {
        let row: RateRow = serde_json::from_str(
            r#"{"time":9223372036854775807,"open":1,"high":1,"low":1,"close":1}"#,
        )
        .unwrap();
        assert!(matches!(row.into_bar(), Err(ProviderError::InvalidData(_))));
    }
}
