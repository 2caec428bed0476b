//! Error types for series storage.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a file codec.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Arrow/Parquet error.
    #[error("Parquet error: {0}")]
    Parquet(String),

    /// A record decoded but holds an invalid value.
    #[error("record {record}: {message}")]
    InvalidRecord {
        /// One-based record number, not counting the header.
        record: u64,
        /// What is wrong with the record.
        message: String,
    },
}

/// Errors that can occur while reading or writing series files.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create a directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to open or read a file.
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write or replace a file.
    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read a directory.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A file could not be decoded.
    #[error("Failed to decode '{path}': {source}")]
    Decode {
        /// The file being decoded.
        path: PathBuf,
        /// The codec error.
        source: FormatError,
    },

    /// A series could not be encoded.
    #[error("Failed to encode '{path}': {source}")]
    Encode {
        /// The file being written.
        path: PathBuf,
        /// The codec error.
        source: FormatError,
    },

    /// A stored file contains the same timestamp more than once.
    #[error("'{path}' contains {count} duplicate timestamps")]
    Duplicates {
        /// The offending file.
        path: PathBuf,
        /// Number of rows sharing a timestamp with an earlier row.
        count: usize,
    },

    /// The canonical file was replaced but the mirror could not be regenerated.
    #[error("Canonical file updated but mirror '{path}' is stale: {source}")]
    MirrorStale {
        /// The mirror file left stale.
        path: PathBuf,
        /// Why regeneration failed.
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// Returns true if the canonical file is intact and only the mirror lags.
    #[must_use]
    pub const fn is_mirror_stale(&self) -> bool {
        matches!(self, Self::MirrorStale { .. })
    }
}
