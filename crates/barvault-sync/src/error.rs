//! Error types for synchronization.

use barvault_fetch::ProviderError;
use barvault_store::StoreError;
use barvault_types::{SeriesKeyError, UnknownTimeframe};
use thiserror::Error;

/// Errors that fail the sync of one series.
///
/// Running out of provider data is not an error; it ends the chunk loop.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The symbol or timeframe key is not valid.
    #[error(transparent)]
    InvalidKey(#[from] SeriesKeyError),

    /// The provider does not know the symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// A provider call failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Reading or writing the archive failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A background store task panicked or was cancelled.
    #[error("Store task failed: {0}")]
    Task(String),
}

impl From<UnknownTimeframe> for SyncError {
    fn from(err: UnknownTimeframe) -> Self {
        Self::InvalidKey(err.into())
    }
}

impl SyncError {
    /// Returns true if the timeframe key was not recognized.
    #[must_use]
    pub const fn is_unknown_timeframe(&self) -> bool {
        matches!(self, Self::InvalidKey(SeriesKeyError::Timeframe(_)))
    }

    /// Returns true if the provider rejected the symbol.
    #[must_use]
    pub const fn is_symbol_not_found(&self) -> bool {
        matches!(self, Self::SymbolNotFound(_))
    }
}
