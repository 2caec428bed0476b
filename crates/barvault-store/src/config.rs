//! Storage configuration.

use parquet::basic::Compression;
use serde::{Deserialize, Serialize};

use crate::FormatError;

/// Row order of persisted files.
///
/// Series are always ascending in memory and after a read; this only controls
/// the order rows are written in, identically for both files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest bar first.
    #[default]
    Ascending,
    /// Newest bar first.
    Descending,
}

impl SortOrder {
    /// Returns the order as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for a [`SeriesStore`](crate::SeriesStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Persisted row order.
    pub sort_order: SortOrder,
    /// Parquet row group size (number of rows per group).
    pub row_group_size: usize,
    /// Parquet compression codec.
    pub compression: Compression,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sort_order: SortOrder::Ascending,
            row_group_size: 100_000,
            compression: Compression::SNAPPY,
        }
    }
}

impl StoreConfig {
    /// Sets the persisted row order.
    #[must_use]
    pub const fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Sets the Parquet row group size.
    #[must_use]
    pub const fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Sets the Parquet compression codec.
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the Parquet compression codec by name, such as `snappy`,
    /// `zstd(3)` or `uncompressed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the codec is unknown or its level is missing or
    /// out of range.
    pub fn with_compression_name(self, name: &str) -> Result<Self, FormatError> {
        let compression = name
            .trim()
            .parse::<Compression>()
            .map_err(|e| FormatError::Parquet(e.to_string()))?;
        Ok(self.with_compression(compression))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::basic::ZstdLevel;

    #[test]
    fn test_compression_by_name() {
        let config = StoreConfig::default().with_compression_name("zstd(3)").unwrap();
        assert_eq!(
            config.compression,
            Compression::ZSTD(ZstdLevel::try_new(3).unwrap())
        );

        let config = config.with_compression_name("uncompressed").unwrap();
        assert_eq!(config.compression, Compression::UNCOMPRESSED);

        assert!(StoreConfig::default().with_compression_name("zip").is_err());
        assert!(StoreConfig::default().with_compression_name("zstd").is_err());
    }

    #[test]
    fn test_sort_order_names() {
        assert_eq!(SortOrder::default(), SortOrder::Ascending);
        assert_eq!(SortOrder::Descending.to_string(), "descending");
    }
}
