//! Incremental synchronization of OHLC series.
//!
//! [`Synchronizer`] keeps a local archive of `(symbol, timeframe)` series in
//! step with a [`MarketDataProvider`](barvault_fetch::MarketDataProvider):
//!
//! 1. resume from the latest stored bar, or [`SyncConfig::epoch`]
//! 2. skip the series if it is inside the [`FreshnessPolicy`] window
//! 3. fetch windows sized by the [`ChunkPolicy`] until the provider has
//!    nothing more or the target end is reached
//! 4. persist once, only if bars were added or revised

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod locks;
mod outcome;
mod synchronizer;

pub use config::{ChunkPolicy, FreshnessPolicy, SyncConfig};
pub use error::SyncError;
pub use outcome::{PairResult, SyncOutcome, SyncReport};
pub use synchronizer::Synchronizer;
