//! The incremental sync loop.

use barvault_fetch::{MarketDataProvider, ProviderError, RangeFetcher};
use barvault_store::SeriesStore;
use barvault_types::{Bar, MergeStats, Series, SeriesKey};
use chrono::{DateTime, TimeDelta, Utc};
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::locks::SeriesLocks;
use crate::{PairResult, SyncConfig, SyncError, SyncOutcome, SyncReport};

/// Brings stored series up to date with a provider.
///
/// For each series the synchronizer resumes from the latest stored bar (or
/// the configured epoch), fetches bounded windows until the provider runs
/// dry or the target end is reached, merges everything in memory and
/// persists once. Syncs of the same series are serialized; different series
/// may run concurrently against the shared provider.
pub struct Synchronizer<P: ?Sized> {
    fetcher: RangeFetcher<P>,
    store: SeriesStore,
    config: SyncConfig,
    locks: SeriesLocks,
}

impl<P: ?Sized> std::fmt::Debug for Synchronizer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("fetcher", &self.fetcher)
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P: MarketDataProvider + ?Sized> Synchronizer<P> {
    /// Creates a synchronizer.
    #[must_use]
    pub fn new(provider: Arc<P>, store: SeriesStore, config: SyncConfig) -> Self {
        Self {
            fetcher: RangeFetcher::new(provider).with_deadline(config.fetch_deadline),
            store,
            config,
            locks: SeriesLocks::default(),
        }
    }

    /// Returns the sync configuration.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the series store.
    #[must_use]
    pub const fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// Returns the provider.
    #[must_use]
    pub const fn provider(&self) -> &Arc<P> {
        self.fetcher.provider()
    }

    /// Syncs `symbol` at the timeframe named by `timeframe` up to `target_end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeframe key is unknown, the symbol is
    /// invalid or unknown to the provider, a provider call fails, or the
    /// store cannot be read or written.
    pub async fn sync(
        &self,
        symbol: &str,
        timeframe: &str,
        target_end: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError> {
        let key = SeriesKey::parse(symbol, timeframe)?;
        self.sync_series(&key, target_end).await
    }

    /// Syncs one series up to `target_end`.
    ///
    /// # Errors
    ///
    /// See [`sync`](Self::sync).
    pub async fn sync_series(
        &self,
        key: &SeriesKey,
        target_end: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError> {
        let _guard = self.locks.acquire(key).await;
        let symbol = key.symbol();
        let spec = key.timeframe().spec();

        if !self.select(symbol).await? {
            return Err(SyncError::SymbolNotFound(symbol.to_string()));
        }

        let mut series = self.read_stored(key).await?.unwrap_or_default();
        let mut checkpoint = series.checkpoint().unwrap_or(self.config.epoch);

        if !series.is_empty() && self.config.freshness.is_fresh(checkpoint, target_end) {
            debug!(series = %key, %checkpoint, %target_end, "within freshness window, skipping");
            self.ensure_mirror(key).await?;
            return Ok(SyncOutcome::AlreadyFresh { checkpoint });
        }

        let span = self.config.chunk_policy.span(&spec);
        let mut stats = MergeStats::default();
        let mut chunks = 0;

        while checkpoint < target_end {
            let window_end = checkpoint
                .checked_add_signed(span)
                .map_or(target_end, |end| end.min(target_end));

            let mut bars = self
                .fetcher
                .fetch(symbol, spec.resolution_code, checkpoint, window_end)
                .await?;

            let Some(newest) = bars.iter().map(|bar| bar.timestamp).max() else {
                debug!(series = %key, window_start = %checkpoint, %window_end, "provider exhausted");
                break;
            };

            chunks += 1;
            checkpoint = newest + TimeDelta::seconds(1);

            // Malformed bars never merge; the checkpoint still moves past them.
            let received = bars.len();
            bars.retain(Bar::is_consistent);
            if bars.len() != received {
                warn!(series = %key, dropped = received - bars.len(), "dropping malformed bars");
            }
            stats += series.merge(bars);
        }

        let outcome = SyncOutcome::from_loop(stats, chunks, checkpoint);
        if stats.changed() {
            self.write_stored(key, series).await?;
        } else if !series.is_empty() {
            self.ensure_mirror(key).await?;
        }

        info!(
            series = %key,
            outcome = outcome.as_str(),
            added = stats.added,
            revised = stats.revised,
            chunks,
            "sync finished"
        );
        Ok(outcome)
    }

    /// Syncs many `(symbol, timeframe key)` pairs, yielding results as they
    /// complete.
    ///
    /// At most [`SyncConfig::parallel`] pairs run at once. A failing pair
    /// never stops the others.
    pub fn sync_stream(
        &self,
        pairs: Vec<(String, String)>,
        target_end: DateTime<Utc>,
    ) -> impl Stream<Item = PairResult> + '_ {
        self.indexed_stream(pairs, target_end).map(|(_, result)| result)
    }

    /// Syncs many `(symbol, timeframe key)` pairs and collects one result per
    /// pair, in request order.
    pub async fn sync_all(
        &self,
        pairs: Vec<(String, String)>,
        target_end: DateTime<Utc>,
    ) -> SyncReport {
        let mut results: Vec<_> = self.indexed_stream(pairs, target_end).collect().await;
        results.sort_by_key(|(index, _)| *index);

        SyncReport {
            results: results.into_iter().map(|(_, result)| result).collect(),
        }
    }

    fn indexed_stream(
        &self,
        pairs: Vec<(String, String)>,
        target_end: DateTime<Utc>,
    ) -> impl Stream<Item = (usize, PairResult)> + '_ {
        stream::iter(pairs.into_iter().enumerate())
            .map(move |(index, (symbol, timeframe))| async move {
                let result = self.sync(&symbol, &timeframe, target_end).await;
                if let Err(e) = &result {
                    warn!(symbol = %symbol, timeframe = %timeframe, error = %e, "sync failed");
                }
                (
                    index,
                    PairResult {
                        symbol,
                        timeframe,
                        result,
                    },
                )
            })
            .buffer_unordered(self.config.parallel.max(1))
    }

    async fn select(&self, symbol: &str) -> Result<bool, SyncError> {
        let deadline = self.fetcher.deadline();
        let selected = tokio::time::timeout(deadline, self.provider().select_symbol(symbol))
            .await
            .map_err(|_| ProviderError::DeadlineExceeded(deadline))??;
        Ok(selected)
    }

    async fn read_stored(&self, key: &SeriesKey) -> Result<Option<Series>, SyncError> {
        let store = self.store.clone();
        let key = key.clone();
        let stored = tokio::task::spawn_blocking(move || store.read(&key))
            .await
            .map_err(|e| SyncError::Task(format!("spawn_blocking failed: {e}")))??;
        Ok(stored)
    }

    /// Repairs a mirror left behind by an earlier failed write.
    async fn ensure_mirror(&self, key: &SeriesKey) -> Result<(), SyncError> {
        let store = self.store.clone();
        let owned = key.clone();
        let rebuilt = tokio::task::spawn_blocking(move || store.ensure_mirror(&owned))
            .await
            .map_err(|e| SyncError::Task(format!("spawn_blocking failed: {e}")))??;
        if rebuilt {
            info!(series = %key, "mirror regenerated");
        }
        Ok(())
    }

    async fn write_stored(&self, key: &SeriesKey, series: Series) -> Result<(), SyncError> {
        let store = self.store.clone();
        let key = key.clone();
        tokio::task::spawn_blocking(move || store.write(&key, &series))
            .await
            .map_err(|e| SyncError::Task(format!("spawn_blocking failed: {e}")))??;
        Ok(())
    }
}
