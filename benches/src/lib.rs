//! Benchmark utilities for barvault.

use async_trait::async_trait;
use barvault_lib::{
    Bar, MarketDataProvider, ProviderError, ResolutionCode, SymbolInfo, Timeframe,
};
use chrono::{DateTime, TimeDelta, Utc};

/// Generates `count` bars spaced one `timeframe` bucket apart from `start`.
///
/// Prices follow a deterministic saw-tooth so runs are comparable.
pub fn synthetic_bars(start: DateTime<Utc>, timeframe: Timeframe, count: usize) -> Vec<Bar> {
    let step = TimeDelta::seconds(i64::try_from(timeframe.seconds()).unwrap_or(i64::MAX));
    let mut ts = start;
    (0..count)
        .map(|i| {
            let open = 1.0 + (i % 97) as f64 * 0.0001;
            let close = open + if i % 2 == 0 { 0.00005 } else { -0.00005 };
            let bar = Bar::new(ts, open, open.max(close) + 0.0002, open.min(close) - 0.0002, close)
                .with_volumes((i % 500) as u64 + 1, 2, 0);
            ts += step;
            bar
        })
        .collect()
}

/// In-memory provider serving a fixed history.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    history: Vec<Bar>,
}

impl SyntheticProvider {
    /// Creates a provider over `history`, which must be ascending.
    pub const fn new(history: Vec<Bar>) -> Self {
        Self { history }
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticProvider {
    async fn select_symbol(&self, _name: &str) -> Result<bool, ProviderError> {
        Ok(true)
    }

    async fn list_symbols(&self) -> Result<Vec<SymbolInfo>, ProviderError> {
        Ok(vec![SymbolInfo {
            name: "SYNTH".to_string(),
            selected: true,
            visible: true,
        }])
    }

    async fn fetch_range(
        &self,
        _symbol: &str,
        _resolution: ResolutionCode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, ProviderError> {
        let from = self.history.partition_point(|b| b.timestamp < start);
        let to = self.history.partition_point(|b| b.timestamp <= end);
        Ok(self.history[from..to.max(from)].to_vec())
    }
}
