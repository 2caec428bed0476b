//! Configuration file loading and command-line overrides.
//!
//! ```toml
//! data_dir = "/srv/barvault"
//! sort_order = "ascending"
//!
//! [mirror]
//! row_group_size = 100000
//! compression = "zstd(3)"
//!
//! [provider]
//! base_url = "http://127.0.0.1:8787"
//! timeout_secs = 30
//! max_retries = 5
//!
//! [sync]
//! symbols = ["EURUSD", "XAUUSD"]
//! timeframes = ["M1", "H1", "D1"]
//! epoch = "2012-01-01"
//! chunk_days = 30
//! freshness_days = 7
//! deadline_secs = 60
//! parallel = 4
//! ```

use anyhow::{Context, Result};
use barvault_lib::prelude::*;
use chrono::TimeDelta;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::display::parse_time;

/// File read when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "barvault.toml";

/// Environment variable holding the provider bearer token.
pub(crate) const TOKEN_ENV: &str = "BARVAULT_API_TOKEN";

/// Contents of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) sort_order: Option<SortOrder>,
    pub(crate) mirror: MirrorSection,
    pub(crate) provider: ProviderSection,
    pub(crate) sync: SyncSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MirrorSection {
    pub(crate) row_group_size: Option<usize>,
    pub(crate) compression: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ProviderSection {
    pub(crate) base_url: Option<String>,
    pub(crate) api_token: Option<String>,
    pub(crate) timeout_secs: Option<u64>,
    pub(crate) max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SyncSection {
    pub(crate) symbols: Vec<String>,
    pub(crate) timeframes: Vec<String>,
    pub(crate) epoch: Option<String>,
    pub(crate) chunk_days: Option<u32>,
    pub(crate) freshness_days: Option<u32>,
    pub(crate) deadline_secs: Option<u64>,
    pub(crate) parallel: Option<usize>,
}

/// Sync flags given on the command line; these win over the file.
#[derive(Debug, Default)]
pub(crate) struct SyncOverrides {
    pub(crate) epoch: Option<String>,
    pub(crate) chunk_days: Option<u32>,
    pub(crate) freshness_days: Option<u32>,
    pub(crate) deadline_secs: Option<u64>,
    pub(crate) parallel: Option<usize>,
}

/// Loads the configuration file.
///
/// An explicit path must exist; the default file is optional.
pub(crate) fn load(path: Option<&Path>) -> Result<FileConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if !required && e.kind() == ErrorKind::NotFound => {
            return Ok(FileConfig::default());
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read config file {}", path.display()));
        }
    };

    let config = FileConfig::parse(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

impl FileConfig {
    /// Parses TOML configuration text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Builds the series store, preferring `data_dir` over the file value.
    pub(crate) fn store(&self, data_dir: Option<PathBuf>) -> Result<SeriesStore> {
        let root = data_dir
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(SeriesStore::default_root);

        let mut config =
            StoreConfig::default().with_sort_order(self.sort_order.unwrap_or_default());
        if let Some(size) = self.mirror.row_group_size {
            config = config.with_row_group_size(size.max(1));
        }
        if let Some(name) = self.mirror.compression.as_deref() {
            config = config
                .with_compression_name(name)
                .with_context(|| format!("Invalid mirror compression '{name}'"))?;
        }
        Ok(SeriesStore::with_config(root, config))
    }

    /// Builds the provider client configuration.
    ///
    /// The token comes from the environment when set, else from the file.
    pub(crate) fn client_config(&self, base_url: Option<&str>) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(url) = base_url.or(self.provider.base_url.as_deref()) {
            config.base_url = url.to_string();
        }
        config.api_token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty())
            .or_else(|| self.provider.api_token.clone());
        if let Some(secs) = self.provider.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = self.provider.max_retries {
            config.max_retries = retries;
        }
        config
    }

    /// Builds the sync configuration with command-line overrides applied.
    pub(crate) fn sync_config(&self, overrides: &SyncOverrides) -> Result<SyncConfig> {
        let file = &self.sync;
        let mut config = SyncConfig::default();

        if let Some(epoch) = overrides.epoch.as_deref().or(file.epoch.as_deref()) {
            config = config.with_epoch(parse_time(epoch)?);
        }

        match overrides.chunk_days.or(file.chunk_days) {
            Some(0) => config = config.with_chunk_policy(ChunkPolicy::BucketDerived),
            Some(days) => {
                config = config.with_chunk_policy(ChunkPolicy::Fixed(TimeDelta::days(days.into())));
            }
            None => {}
        }

        match overrides.freshness_days.or(file.freshness_days) {
            Some(0) => config = config.with_freshness(FreshnessPolicy::Disabled),
            Some(days) => {
                config =
                    config.with_freshness(FreshnessPolicy::SkipWithin(TimeDelta::days(days.into())));
            }
            None => {}
        }

        if let Some(secs) = overrides.deadline_secs.or(file.deadline_secs) {
            config = config.with_fetch_deadline(Duration::from_secs(secs));
        }

        if let Some(parallel) = overrides.parallel.or(file.parallel) {
            config = config.with_parallel(parallel.max(1));
        }

        Ok(config)
    }
}
