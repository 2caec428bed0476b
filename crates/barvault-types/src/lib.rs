//! Core types for the barvault OHLC archive.
//!
//! This crate provides the fundamental data structures used throughout barvault:
//!
//! - [`Bar`] - One OHLC bucket with tick volume, spread and real volume
//! - [`Series`] - Ordered, timestamp-unique collection of bars with merge/dedup
//! - [`SeriesKey`] - The `(symbol, timeframe)` pair identifying a series
//! - [`Timeframe`] - Closed registry of supported bar timeframes
//! - [`TimeframeSpec`] - Provider resolution code and bucket size of a timeframe

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bar;
mod error;
mod key;
mod series;
mod timeframe;

pub use bar::Bar;
pub use error::{SeriesKeyError, UnknownTimeframe};
pub use key::SeriesKey;
pub use series::{MergeStats, Series, merge};
pub use timeframe::{BARS_PER_WINDOW, ResolutionCode, Timeframe, TimeframeSpec, resolve};
