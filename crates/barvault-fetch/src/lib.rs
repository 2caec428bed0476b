//! Market-data provider interface and range fetching for barvault.
//!
//! This crate sits between the sync engine and the outside world:
//!
//! - [`MarketDataProvider`] - Injected capability for symbol selection and bar retrieval
//! - [`RangeFetcher`] - One bounded-window request per call, with a deadline
//! - [`HttpProvider`] - REST bridge implementation with pooling and retries

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod fetcher;
mod provider;
mod wire;

pub use client::{ClientConfig, HttpProvider};
pub use fetcher::RangeFetcher;
pub use provider::{MarketDataProvider, ProviderError, SymbolInfo};
