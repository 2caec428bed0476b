//! On-disk storage for barvault series.
//!
//! Every `(symbol, timeframe)` series lives in two files under
//! `<root>/<timeframe>/`:
//!
//! - `<symbol>_<timeframe>.csv` - the canonical, row-oriented file
//! - `<symbol>_<timeframe>.parquet` - a columnar mirror regenerated in full
//!   from the canonical file after every write
//!
//! - [`SeriesStore`] - Reads, writes and repairs series files
//! - [`CsvFormat`] / [`ParquetFormat`] - The two file codecs
//! - [`StoreConfig`] / [`SortOrder`] - Persisted row order and Parquet tuning

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod canonical;
mod config;
mod error;
mod format;
mod mirror;
mod store;

pub use canonical::CsvFormat;
pub use config::{SortOrder, StoreConfig};
pub use error::{FormatError, StoreError};
pub use format::SeriesFormat;
pub use mirror::ParquetFormat;
pub use store::{MirrorState, SeriesStore, SeriesSummary};
