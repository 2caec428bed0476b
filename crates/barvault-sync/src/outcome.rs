//! Sync results.

use barvault_types::MergeStats;
use chrono::{DateTime, Utc};

use crate::SyncError;

/// Successful result of syncing one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// New or revised bars were persisted.
    Updated {
        /// Bars appended to the series.
        added: usize,
        /// Stored bars replaced with different values.
        revised: usize,
        /// Non-empty chunks fetched.
        chunks: usize,
        /// Where the next chunk loop starts.
        checkpoint: DateTime<Utc>,
    },
    /// The stored series was within the freshness window; nothing was fetched.
    AlreadyFresh {
        /// Latest stored timestamp.
        checkpoint: DateTime<Utc>,
    },
    /// The provider had nothing new; nothing was written.
    NoData {
        /// Where the chunk loop stopped.
        checkpoint: DateTime<Utc>,
    },
}

impl SyncOutcome {
    pub(crate) fn from_loop(stats: MergeStats, chunks: usize, checkpoint: DateTime<Utc>) -> Self {
        if stats.changed() {
            Self::Updated {
                added: stats.added,
                revised: stats.revised,
                chunks,
                checkpoint,
            }
        } else {
            Self::NoData { checkpoint }
        }
    }

    /// Returns the outcome's checkpoint.
    #[must_use]
    pub const fn checkpoint(&self) -> DateTime<Utc> {
        match self {
            Self::Updated { checkpoint, .. }
            | Self::AlreadyFresh { checkpoint }
            | Self::NoData { checkpoint } => *checkpoint,
        }
    }

    /// Returns the outcome as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::AlreadyFresh { .. } => "already_fresh",
            Self::NoData { .. } => "no_data",
        }
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Updated { added, revised, .. } => {
                write!(f, "updated (+{added} bars, {revised} revised)")
            }
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Result of syncing one `(symbol, timeframe)` pair in a batch.
#[derive(Debug)]
pub struct PairResult {
    /// Requested symbol.
    pub symbol: String,
    /// Requested timeframe key.
    pub timeframe: String,
    /// Outcome or failure.
    pub result: Result<SyncOutcome, SyncError>,
}

impl PairResult {
    /// Returns the pair as `SYMBOL/TIMEFRAME`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.symbol, self.timeframe)
    }
}

/// Results of a batch sync, in request order.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// One entry per requested pair.
    pub results: Vec<PairResult>,
}

impl SyncReport {
    /// Number of pairs that synced without error.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_ok()).count()
    }

    /// Pairs that failed.
    pub fn failures(&self) -> impl Iterator<Item = &PairResult> {
        self.results.iter().filter(|r| r.result.is_err())
    }

    /// Number of pairs that persisted new data.
    #[must_use]
    pub fn updated(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.result, Ok(SyncOutcome::Updated { .. })))
            .count()
    }
}
