//! Provider abstraction for market-data sources.
//!
//! The sync engine never talks to a terminal or vendor API directly. It is
//! handed an implementation of [`MarketDataProvider`] whose connection
//! lifecycle is managed by the caller. Implementations must be safe to share
//! between concurrent syncs.

use async_trait::async_trait;
use barvault_types::{Bar, ResolutionCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A symbol as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Provider symbol name (e.g. "EURUSD", "WINZ24").
    pub name: String,
    /// Whether the symbol is selected for data delivery.
    #[serde(default)]
    pub selected: bool,
    /// Whether the symbol is visible in the provider's market watch.
    #[serde(default)]
    pub visible: bool,
}

/// Errors reported by a provider or the range fetcher.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP transport or decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider kept answering with a server error.
    #[error("Server error: {status}")]
    ServerError {
        /// HTTP status code.
        status: u16,
    },

    /// The fetch did not complete within its deadline.
    #[error("Fetch exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// The provider returned data that cannot be turned into bars.
    #[error("Invalid provider data: {0}")]
    InvalidData(String),

    /// The requested window is empty or inverted.
    #[error("Invalid fetch window: {start} > {end}")]
    InvalidWindow {
        /// Window start.
        start: DateTime<Utc>,
        /// Window end.
        end: DateTime<Utc>,
    },

    /// The provider is not reachable or not configured.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Market-data source consumed by the sync engine.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Selects a symbol for data delivery.
    ///
    /// Returns `Ok(false)` if the provider does not know the symbol.
    async fn select_symbol(&self, name: &str) -> Result<bool, ProviderError>;

    /// Lists the symbols known to the provider.
    async fn list_symbols(&self) -> Result<Vec<SymbolInfo>, ProviderError>;

    /// Returns the bars of `symbol` whose timestamps fall in `[start, end]`.
    ///
    /// An empty vector means the provider has no data for the window.
    async fn fetch_range(
        &self,
        symbol: &str,
        resolution: ResolutionCode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, ProviderError>;
}
