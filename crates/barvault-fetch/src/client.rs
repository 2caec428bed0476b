//! HTTP provider talking to a REST bridge in front of the trading terminal.
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET  symbols` - list of `{name, selected, visible}`
//! - `POST symbols/{name}/select` - 2xx when selected, 404 for unknown symbols
//! - `GET  rates?symbol=&timeframe=&from=&to=` - bars in `[from, to]` (unix seconds)

use async_trait::async_trait;
use barvault_types::{Bar, ResolutionCode};
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, warn};

use crate::wire::{RateRow, SelectReply};
use crate::{MarketDataProvider, ProviderError, SymbolInfo};

/// Configuration for the HTTP provider.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the bridge.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub api_token: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for failed requests.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds).
    pub max_delay_ms: u64,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            api_token: None,
            timeout: Duration::from_secs(30),
            max_retries: 5,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            user_agent: format!("barvault/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// [`MarketDataProvider`] backed by the REST bridge.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    base_url: Url,
    config: ClientConfig,
}

impl HttpProvider {
    /// Creates a provider with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn new(config: ClientConfig) -> Result<Self, ProviderError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ProviderError::Unavailable(format!("invalid base URL '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::Unavailable(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            // The bridge is a single host; keep a handful of warm connections.
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Creates a provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, ProviderError> {
        Self::new(ClientConfig::default())
    }

    /// Returns the provider configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds an endpoint URL by appending path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejected cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends a request, retrying transient failures.
    ///
    /// Returns `Ok(None)` when the bridge answers 404.
    async fn send<F>(&self, build: F) -> Result<Option<Response>, ProviderError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempts = 0;

        loop {
            let mut request = build();
            if let Some(token) = &self.config.api_token {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Ok(None);
                    }

                    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        if attempts < self.config.max_retries {
                            attempts += 1;
                            let delay = self.calculate_backoff_delay(attempts);
                            warn!(%status, attempts, ?delay, "provider busy, retrying");
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(ProviderError::ServerError {
                            status: status.as_u16(),
                        });
                    }

                    return Ok(Some(response.error_for_status()?));
                }
                Err(e) if Self::is_retryable_error(&e) && attempts < self.config.max_retries => {
                    attempts += 1;
                    let delay = self.calculate_backoff_delay(attempts);
                    warn!(error = %e, attempts, ?delay, "provider request failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Calculates the backoff delay with exponential backoff and jitter.
    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        let exp_delay = self
            .config
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(10));
        let capped_delay = exp_delay.min(self.config.max_delay_ms);

        // Deterministic jitter of up to ±25%.
        let jitter_range = capped_delay / 4;
        let jitter = if jitter_range > 0 {
            let offset = (u64::from(attempt) * 17) % (jitter_range * 2);
            offset as i64 - jitter_range as i64
        } else {
            0
        };

        let final_delay = (capped_delay as i64 + jitter).max(100) as u64;
        Duration::from_millis(final_delay)
    }

    /// Determines if a transport error is worth retrying.
    fn is_retryable_error(error: &reqwest::Error) -> bool {
        if error.is_builder() {
            return false;
        }
        error.is_timeout() || error.is_connect() || error.is_request()
    }
}

#[async_trait]
impl MarketDataProvider for HttpProvider {
    async fn select_symbol(&self, name: &str) -> Result<bool, ProviderError> {
        let url = self.endpoint(&["symbols", name, "select"]);
        let Some(response) = self.send(|| self.client.post(url.clone())).await? else {
            return Ok(false);
        };

        // An empty 2xx body counts as success.
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(true);
        }
        serde_json::from_slice::<SelectReply>(&body)
            .map(|reply| reply.selected)
            .map_err(|e| ProviderError::InvalidData(format!("select reply: {e}")))
    }

    async fn list_symbols(&self) -> Result<Vec<SymbolInfo>, ProviderError> {
        let url = self.endpoint(&["symbols"]);
        let response = self
            .send(|| self.client.get(url.clone()))
            .await?
            .ok_or_else(|| ProviderError::Unavailable(format!("{url} not found")))?;

        Ok(response.json::<Vec<SymbolInfo>>().await?)
    }

    async fn fetch_range(
        &self,
        symbol: &str,
        resolution: ResolutionCode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, ProviderError> {
        let url = self.endpoint(&["rates"]);
        let query = [
            ("symbol", symbol.to_string()),
            ("timeframe", resolution.as_str().to_string()),
            ("from", start.timestamp().to_string()),
            ("to", end.timestamp().to_string()),
        ];

        let Some(response) = self
            .send(|| self.client.get(url.clone()).query(&query))
            .await?
        else {
            debug!(symbol, %resolution, "rates endpoint returned 404, treating as no data");
            return Ok(Vec::new());
        };

        response
            .json::<Vec<RateRow>>()
            .await?
            .into_iter()
            .map(RateRow::into_bar)
            .collect()
    }
}
