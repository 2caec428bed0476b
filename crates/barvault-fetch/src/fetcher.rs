//! Bounded-window bar fetching.

use barvault_types::{Bar, ResolutionCode};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{MarketDataProvider, ProviderError};

/// Issues exactly one provider request per call for a bounded window.
///
/// Every request runs under a deadline so a stalled provider cannot block a
/// sync forever. Bars outside the requested window are discarded, which keeps
/// the caller's checkpoint strictly increasing.
pub struct RangeFetcher<P: ?Sized> {
    provider: Arc<P>,
    deadline: Duration,
}

impl<P: ?Sized> std::fmt::Debug for RangeFetcher<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeFetcher")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl<P: ?Sized> Clone for RangeFetcher<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            deadline: self.deadline,
        }
    }
}

impl<P: MarketDataProvider + ?Sized> RangeFetcher<P> {
    /// Default per-request deadline.
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

    /// Creates a fetcher with the default deadline.
    #[must_use]
    pub const fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            deadline: Self::DEFAULT_DEADLINE,
        }
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns the per-request deadline.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Returns the underlying provider.
    #[must_use]
    pub const fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Fetches the bars of `symbol` in `[window_start, window_end]`.
    ///
    /// An empty result means the provider has nothing for the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the window is inverted, the provider fails, or the
    /// request exceeds the deadline.
    pub async fn fetch(
        &self,
        symbol: &str,
        resolution: ResolutionCode,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, ProviderError> {
        if window_start > window_end {
            return Err(ProviderError::InvalidWindow {
                start: window_start,
                end: window_end,
            });
        }

        let mut bars = tokio::time::timeout(
            self.deadline,
            self.provider
                .fetch_range(symbol, resolution, window_start, window_end),
        )
        .await
        .map_err(|_| ProviderError::DeadlineExceeded(self.deadline))??;

        let received = bars.len();
        bars.retain(|bar| bar.timestamp >= window_start && bar.timestamp <= window_end);
        if bars.len() != received {
            warn!(
                symbol,
                %resolution,
                dropped = received - bars.len(),
                "provider returned bars outside the requested window"
            );
        }

        debug!(
            symbol,
            %resolution,
            %window_start,
            %window_end,
            bars = bars.len(),
            "fetched window"
        );
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SymbolInfo;
    use async_trait::async_trait;
    use barvault_types::Timeframe;
    use chrono::TimeZone;

    struct FixedProvider {
        bars: Vec<Bar>,
        delay: Duration,
    }

    #[async_trait]
    impl MarketDataProvider for FixedProvider {
        async fn select_symbol(&self, _name: &str) -> Result<bool, ProviderError> {
            Ok(true)
        }

        async fn list_symbols(&self) -> Result<Vec<SymbolInfo>, ProviderError> {
            Ok(Vec::new())
        }

        async fn fetch_range(
            &self,
            _symbol: &str,
            _resolution: ResolutionCode,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<Bar>, ProviderError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.bars.clone())
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn bar(secs: i64) -> Bar {
        Bar::new(at(secs), 1.0, 1.0, 1.0, 1.0)
    }

    #[tokio::test]
    async fn test_fetch_drops_bars_outside_window() {
        let provider = Arc::new(FixedProvider {
            bars: vec![bar(50), bar(100), bar(150), bar(200), bar(250)],
            delay: Duration::ZERO,
        });
        let fetcher = RangeFetcher::new(provider);

        let bars = fetcher
            .fetch("EURUSD", Timeframe::Minute1.resolution_code(), at(100), at(200))
            .await
            .unwrap();

        let secs: Vec<_> = bars.iter().map(|b| b.timestamp.timestamp()).collect();
        assert_eq!(secs, vec![100, 150, 200]);
    }

    #[tokio::test]
    async fn test_fetch_rejects_inverted_window() {
        let provider = Arc::new(FixedProvider {
            bars: Vec::new(),
            delay: Duration::ZERO,
        });
        let fetcher = RangeFetcher::new(provider);

        let result = fetcher
            .fetch("EURUSD", Timeframe::Hour1.resolution_code(), at(200), at(100))
            .await;
        assert!(matches!(result, Err(ProviderError::InvalidWindow { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_deadline() {
        let provider = Arc::new(FixedProvider {
            bars: vec![bar(100)],
            delay: Duration::from_secs(120),
        });
        let fetcher = RangeFetcher::new(provider).with_deadline(Duration::from_secs(5));

        let result = fetcher
            .fetch("EURUSD", Timeframe::Hour1.resolution_code(), at(0), at(1000))
            .await;
        assert!(matches!(
            result,
            Err(ProviderError::DeadlineExceeded(d)) if d == Duration::from_secs(5)
        ));
    }

    #[test]
    fn test_works_with_trait_objects() {
        let provider: Arc<dyn MarketDataProvider> = Arc::new(FixedProvider {
            bars: Vec::new(),
            delay: Duration::ZERO,
        });
        let fetcher = RangeFetcher::new(provider);
        assert_eq!(fetcher.deadline(), RangeFetcher::<dyn MarketDataProvider>::DEFAULT_DEADLINE);
    }
}
