//! Incremental OHLC archive synchronization.
//!
//! This is a facade crate that re-exports functionality from the barvault
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use barvault_lib::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Arc::new(HttpProvider::with_defaults()?);
//!     let store = SeriesStore::new(SeriesStore::default_root());
//!     let sync = Synchronizer::new(provider, store, SyncConfig::default());
//!
//!     let outcome = sync.sync("EURUSD", "H1", chrono::Utc::now()).await?;
//!     println!("EURUSD/H1: {outcome}");
//!
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use barvault_types::*;

// Re-export provider interface
#[cfg(feature = "fetch")]
pub use barvault_fetch::{
    ClientConfig, HttpProvider, MarketDataProvider, ProviderError, RangeFetcher, SymbolInfo,
};

// Re-export storage
#[cfg(feature = "store")]
pub use barvault_store::{
    CsvFormat, FormatError, MirrorState, ParquetFormat, SeriesFormat, SeriesStore, SeriesSummary,
    SortOrder, StoreConfig, StoreError,
};

// Re-export the sync engine
#[cfg(feature = "sync")]
pub use barvault_sync::{
    ChunkPolicy, FreshnessPolicy, PairResult, SyncConfig, SyncError, SyncOutcome, SyncReport,
    Synchronizer,
};

/// Prelude module for convenient imports.
///
/// ```
/// use barvault_lib::prelude::*;
/// ```
pub mod prelude {
    pub use barvault_types::{Bar, Series, SeriesKey, Timeframe, TimeframeSpec, merge, resolve};

    #[cfg(feature = "fetch")]
    pub use barvault_fetch::{ClientConfig, HttpProvider, MarketDataProvider, SymbolInfo};

    #[cfg(feature = "store")]
    pub use barvault_store::{SeriesStore, SortOrder, StoreConfig};

    #[cfg(feature = "sync")]
    pub use barvault_sync::{ChunkPolicy, FreshnessPolicy, SyncConfig, SyncOutcome, Synchronizer};
}
