//! Sync policies.

use barvault_types::TimeframeSpec;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// How wide each fetch window of the chunk loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkPolicy {
    /// The same span for every timeframe.
    Fixed(TimeDelta),
    /// `bucket_seconds * BARS_PER_WINDOW`, so every window holds about the
    /// same number of bars.
    #[default]
    BucketDerived,
}

impl ChunkPolicy {
    /// Returns the window span for a timeframe, never less than one second.
    #[must_use]
    pub fn span(&self, spec: &TimeframeSpec) -> TimeDelta {
        let span = match self {
            Self::Fixed(span) => *span,
            Self::BucketDerived => i64::try_from(spec.default_window_seconds())
                .ok()
                .and_then(TimeDelta::try_seconds)
                .unwrap_or(TimeDelta::MAX),
        };
        span.max(TimeDelta::seconds(1))
    }
}

/// When a stored series is recent enough to skip fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessPolicy {
    /// Always run the chunk loop.
    Disabled,
    /// Skip when the stored checkpoint is within this span of the target end.
    SkipWithin(TimeDelta),
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::SkipWithin(TimeDelta::days(7))
    }
}

impl FreshnessPolicy {
    /// Returns true if `checkpoint` needs no refresh before `target_end`.
    #[must_use]
    pub fn is_fresh(&self, checkpoint: DateTime<Utc>, target_end: DateTime<Utc>) -> bool {
        match self {
            Self::Disabled => false,
            Self::SkipWithin(window) => target_end.signed_duration_since(checkpoint) <= *window,
        }
    }
}

/// Configuration for a [`Synchronizer`](crate::Synchronizer).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Checkpoint used for a series with no stored bars.
    pub epoch: DateTime<Utc>,
    /// Fetch window sizing.
    pub chunk_policy: ChunkPolicy,
    /// Freshness gate.
    pub freshness: FreshnessPolicy,
    /// Deadline applied to every provider call.
    pub fetch_deadline: Duration,
    /// Maximum number of series synced concurrently by a batch.
    pub parallel: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            epoch: default_epoch(),
            chunk_policy: ChunkPolicy::default(),
            freshness: FreshnessPolicy::default(),
            fetch_deadline: Duration::from_secs(60),
            parallel: 4,
        }
    }
}

impl SyncConfig {
    /// Sets the epoch checkpoint.
    #[must_use]
    pub const fn with_epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = epoch;
        self
    }

    /// Sets the chunk policy.
    #[must_use]
    pub const fn with_chunk_policy(mut self, policy: ChunkPolicy) -> Self {
        self.chunk_policy = policy;
        self
    }

    /// Sets the freshness policy.
    #[must_use]
    pub const fn with_freshness(mut self, policy: FreshnessPolicy) -> Self {
        self.freshness = policy;
        self
    }

    /// Sets the per-call provider deadline.
    #[must_use]
    pub const fn with_fetch_deadline(mut self, deadline: Duration) -> Self {
        self.fetch_deadline = deadline;
        self
    }

    /// Sets the batch concurrency.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel;
        self
    }
}

/// 2012-01-01T00:00:00Z.
fn default_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_325_376_000, 0).unwrap_or_default()
}
