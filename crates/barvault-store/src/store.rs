//! Series file management.

use barvault_types::{Bar, Series, SeriesKey, Timeframe};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{
    CsvFormat, FormatError, ParquetFormat, SeriesFormat, SortOrder, StoreConfig, StoreError,
};

/// Result type for store operations.
type Result<T> = std::result::Result<T, StoreError>;

/// Agreement between a canonical file and its mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorState {
    /// The mirror holds exactly the canonical bars.
    Consistent,
    /// The mirror exists but differs from the canonical file or cannot be read.
    Stale,
    /// There is no mirror file.
    Missing,
}

impl MirrorState {
    /// Returns the state as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Consistent => "consistent",
            Self::Stale => "stale",
            Self::Missing => "missing",
        }
    }
}

impl std::fmt::Display for MirrorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overview of one stored series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    /// Series identity.
    pub key: SeriesKey,
    /// Number of stored bars.
    pub bars: usize,
    /// Oldest bar timestamp.
    pub first: Option<DateTime<Utc>>,
    /// Newest bar timestamp.
    pub last: Option<DateTime<Utc>>,
    /// Mirror file state.
    pub mirror: MirrorState,
}

/// Reads and writes series files under a root directory.
///
/// Layout is `<root>/<timeframe>/<symbol>_<timeframe>.{csv,parquet}`. The
/// store performs no locking: callers serialize writers per series.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    root: PathBuf,
    config: StoreConfig,
    csv: CsvFormat,
    parquet: ParquetFormat,
}

impl SeriesStore {
    /// Creates a store rooted at `root` with default configuration.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, StoreConfig::default())
    }

    /// Creates a store rooted at `root`.
    #[must_use]
    pub fn with_config(root: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self {
            root: root.into(),
            parquet: ParquetFormat::from_config(&config),
            csv: CsvFormat::new(),
            config,
        }
    }

    /// Returns the default data root.
    ///
    /// On Linux: `~/.local/share/barvault/`
    /// On macOS: `~/Library/Application Support/barvault/`
    /// On Windows: `C:\Users\<User>\AppData\Roaming\barvault\`
    #[must_use]
    pub fn default_root() -> PathBuf {
        ProjectDirs::from("", "", "barvault").map_or_else(dirs_fallback, |proj_dirs| {
            proj_dirs.data_dir().to_path_buf()
        })
    }

    /// Returns the data root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the directory holding all series of a timeframe.
    #[must_use]
    pub fn series_dir(&self, timeframe: Timeframe) -> PathBuf {
        self.root.join(timeframe.as_str())
    }

    /// Returns the canonical CSV path of a series.
    #[must_use]
    pub fn canonical_path(&self, key: &SeriesKey) -> PathBuf {
        self.file_path(key, self.csv.extension())
    }

    /// Returns the Parquet mirror path of a series.
    #[must_use]
    pub fn mirror_path(&self, key: &SeriesKey) -> PathBuf {
        self.file_path(key, self.parquet.extension())
    }

    fn file_path(&self, key: &SeriesKey, extension: &str) -> PathBuf {
        self.series_dir(key.timeframe())
            .join(format!("{}.{extension}", key.file_stem()))
    }

    /// Reads the canonical file.
    ///
    /// Returns `Ok(None)` when the series has never been written. Bars come
    /// back ascending whatever the persisted order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, fails to decode, or holds
    /// duplicate timestamps.
    pub fn read(&self, key: &SeriesKey) -> Result<Option<Series>> {
        load(&self.csv, &self.canonical_path(key))
    }

    /// Reads the Parquet mirror.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, fails to decode, or holds
    /// duplicate timestamps.
    pub fn read_mirror(&self, key: &SeriesKey) -> Result<Option<Series>> {
        load(&self.parquet, &self.mirror_path(key))
    }

    /// Replaces the stored series.
    ///
    /// The canonical file is swapped in atomically, then the mirror is
    /// regenerated in full from the canonical file.
    ///
    /// # Errors
    ///
    /// Returns an error if the canonical file cannot be written; it is left
    /// untouched in that case. Returns [`StoreError::MirrorStale`] if only
    /// the mirror regeneration failed.
    pub fn write(&self, key: &SeriesKey, series: &Series) -> Result<()> {
        let dir = self.series_dir(key.timeframe());
        fs::create_dir_all(&dir).map_err(|e| StoreError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;

        let canonical = self.canonical_path(key);
        let rows = self.ordered(series);
        atomic_write(&canonical, |w| self.csv.write_bars(&rows, w))?;
        debug!(series = %key, bars = series.len(), path = %canonical.display(), "canonical file written");

        self.rebuild_mirror(key)
            .map(|_| ())
            .map_err(|source| self.stale(key, source))
    }

    /// Regenerates the mirror when it is missing or older than the canonical
    /// file.
    ///
    /// Returns `true` if the mirror was regenerated. A series without a
    /// canonical file is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MirrorStale`] if a regeneration was needed and
    /// failed, or an error if the canonical file cannot be inspected.
    pub fn ensure_mirror(&self, key: &SeriesKey) -> Result<bool> {
        let canonical = self.canonical_path(key);
        let canonical_modified = match fs::metadata(&canonical) {
            Ok(meta) => meta.modified().ok(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(StoreError::ReadFile {
                    path: canonical,
                    source: e,
                });
            }
        };

        let mirror_modified = fs::metadata(self.mirror_path(key))
            .ok()
            .filter(fs::Metadata::is_file)
            .map(|meta| meta.modified().ok());
        if mirror_modified.is_some_and(|modified| modified >= canonical_modified) {
            return Ok(false);
        }

        warn!(series = %key, "mirror missing or older than canonical file, regenerating");
        self.rebuild_mirror(key)
            .map_err(|source| self.stale(key, source))?;
        Ok(true)
    }

    fn stale(&self, key: &SeriesKey, source: StoreError) -> StoreError {
        StoreError::MirrorStale {
            path: self.mirror_path(key),
            source: Box::new(source),
        }
    }

    /// Regenerates the mirror from the canonical file.
    ///
    /// Returns the number of bars mirrored, or `None` if there is no
    /// canonical file.
    ///
    /// # Errors
    ///
    /// Returns an error if the canonical file cannot be read or the mirror
    /// cannot be written.
    pub fn rebuild_mirror(&self, key: &SeriesKey) -> Result<Option<usize>> {
        let Some(series) = self.read(key)? else {
            return Ok(None);
        };

        let mirror = self.mirror_path(key);
        let rows = self.ordered(&series);
        atomic_write(&mirror, |w| self.parquet.write_bars(&rows, w))?;
        debug!(series = %key, bars = series.len(), path = %mirror.display(), "mirror regenerated");

        Ok(Some(series.len()))
    }

    /// Summarizes a stored series.
    ///
    /// Returns `None` if the series has no canonical file.
    ///
    /// # Errors
    ///
    /// Returns an error if the canonical file cannot be read. Mirror problems
    /// are reported through [`SeriesSummary::mirror`].
    pub fn summary(&self, key: &SeriesKey) -> Result<Option<SeriesSummary>> {
        let Some(series) = self.read(key)? else {
            return Ok(None);
        };

        let mirror = match self.read_mirror(key) {
            Ok(Some(mirrored)) if mirrored == series => MirrorState::Consistent,
            Ok(Some(_)) => MirrorState::Stale,
            Ok(None) => MirrorState::Missing,
            Err(e) => {
                warn!(series = %key, error = %e, "mirror unreadable");
                MirrorState::Stale
            }
        };

        Ok(Some(SeriesSummary {
            key: key.clone(),
            bars: series.len(),
            first: series.first().map(|b| b.timestamp),
            last: series.last().map(|b| b.timestamp),
            mirror,
        }))
    }

    /// Lists every series with a canonical file, sorted by symbol then
    /// timeframe.
    ///
    /// # Errors
    ///
    /// Returns an error if a timeframe directory cannot be read.
    pub fn list(&self) -> Result<Vec<SeriesKey>> {
        let mut keys = Vec::new();

        for &timeframe in Timeframe::all() {
            let dir = self.series_dir(timeframe);
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::ReadDir { path: dir, source: e }),
            };

            let suffix = format!("_{timeframe}.{}", self.csv.extension());
            for entry in entries {
                let entry = entry.map_err(|e| StoreError::ReadDir {
                    path: dir.clone(),
                    source: e,
                })?;

                let name = entry.file_name();
                let Some(symbol) = name.to_str().and_then(|n| n.strip_suffix(&suffix)) else {
                    continue;
                };
                match SeriesKey::new(symbol, timeframe) {
                    Ok(key) => keys.push(key),
                    Err(e) => warn!(file = ?entry.path(), error = %e, "skipping unrecognized file"),
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Returns bars in the configured persisted order.
    fn ordered<'a>(&self, series: &'a Series) -> Cow<'a, [Bar]> {
        match self.config.sort_order {
            SortOrder::Ascending => Cow::Borrowed(series.bars()),
            SortOrder::Descending => Cow::Owned(series.bars().iter().rev().copied().collect()),
        }
    }
}

/// Decodes a file into a normalized series.
fn load<F: SeriesFormat>(format: &F, path: &Path) -> Result<Option<Series>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::ReadFile {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let bars = format.read_bars(file).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let rows = bars.len();
    let series = Series::from_bars(bars);
    if series.len() != rows {
        return Err(StoreError::Duplicates {
            path: path.to_path_buf(),
            count: rows - series.len(),
        });
    }

    Ok(Some(series))
}

/// Writes `path` through a sibling temporary file and renames it into place.
///
/// Readers observe either the previous file or the complete new one.
fn atomic_write<F>(path: &Path, encode: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> std::result::Result<(), FormatError>,
{
    let write_err = |e: std::io::Error| StoreError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        encode(&mut writer).map_err(|source| StoreError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;

    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Fallback for determining home directory.
fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".barvault")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn key(symbol: &str, timeframe: Timeframe) -> SeriesKey {
        SeriesKey::new(symbol, timeframe).unwrap()
    }

    fn bar(secs: i64, close: f64) -> Bar {
        Bar::new(
            Utc.timestamp_opt(secs, 0).unwrap(),
            close,
            close + 0.5,
            close - 0.5,
            close,
        )
        .with_volumes(5, 1, 0)
    }

    fn sample() -> Series {
        Series::from_bars(vec![bar(100, 1.0), bar(200, 2.0), bar(300, 3.0)])
    }

    #[test]
    fn test_paths() {
        let store = SeriesStore::new("/data");
        let k = key("EURUSD", Timeframe::Hour1);
        assert_eq!(store.canonical_path(&k), PathBuf::from("/data/H1/EURUSD_H1.csv"));
        assert_eq!(store.mirror_path(&k), PathBuf::from("/data/H1/EURUSD_H1.parquet"));
    }

    #[test]
    fn test_default_root() {
        let root = SeriesStore::default_root();
        assert!(root.to_string_lossy().contains("barvault"));
    }

    #[test]
    fn test_read_absent() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        let k = key("EURUSD", Timeframe::Minute1);

        assert!(store.read(&k).unwrap().is_none());
        assert!(store.read_mirror(&k).unwrap().is_none());
        assert!(store.summary(&k).unwrap().is_none());
        assert!(store.rebuild_mirror(&k).unwrap().is_none());
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        let k = key("EURUSD", Timeframe::Minute1);

        store.write(&k, &sample()).unwrap();

        assert!(store.canonical_path(&k).exists());
        assert_eq!(store.read(&k).unwrap(), Some(sample()));
        assert_eq!(store.read_mirror(&k).unwrap(), Some(sample()));
    }

    #[test]
    fn test_write_replaces_previous_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        let k = key("EURUSD", Timeframe::Minute1);

        store.write(&k, &sample()).unwrap();
        let shorter = Series::from_bars(vec![bar(500, 5.0)]);
        store.write(&k, &shorter).unwrap();

        assert_eq!(store.read(&k).unwrap(), Some(shorter.clone()));
        assert_eq!(store.read_mirror(&k).unwrap(), Some(shorter));

        // No temporary files left behind.
        let leftovers: Vec<_> = fs::read_dir(store.series_dir(Timeframe::Minute1))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_same_content_same_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        let k = key("XAUUSD", Timeframe::Day1);

        store.write(&k, &sample()).unwrap();
        let csv_before = fs::read(store.canonical_path(&k)).unwrap();
        let parquet_before = fs::read(store.mirror_path(&k)).unwrap();

        store.write(&k, &sample()).unwrap();
        assert_eq!(fs::read(store.canonical_path(&k)).unwrap(), csv_before);
        assert_eq!(fs::read(store.mirror_path(&k)).unwrap(), parquet_before);
    }

    #[test]
    fn test_descending_order() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::default().with_sort_order(SortOrder::Descending);
        let store = SeriesStore::with_config(temp_dir.path(), config);
        let k = key("EURUSD", Timeframe::Minute5);

        store.write(&k, &sample()).unwrap();

        let text = fs::read_to_string(store.canonical_path(&k)).unwrap();
        let first_row = text.lines().nth(1).unwrap();
        assert!(first_row.starts_with("1970-01-01T00:05:00Z"));

        // Reads normalize to ascending for both files.
        assert_eq!(store.read(&k).unwrap(), Some(sample()));
        assert_eq!(store.read_mirror(&k).unwrap(), Some(sample()));
    }

    #[test]
    fn test_duplicate_rows_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        let k = key("EURUSD", Timeframe::Minute1);

        fs::create_dir_all(store.series_dir(Timeframe::Minute1)).unwrap();
        fs::write(
            store.canonical_path(&k),
            "time,open,high,low,close,tick_volume,spread,real_volume\n\
             1970-01-01T00:01:00Z,1,1,1,1,0,0,0\n\
             1970-01-01T00:01:00Z,2,2,2,2,0,0,0\n",
        )
        .unwrap();

        assert!(matches!(
            store.read(&k),
            Err(StoreError::Duplicates { count: 1, .. })
        ));
    }

    #[test]
    fn test_corrupt_row_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        let k = key("EURUSD", Timeframe::Minute1);

        fs::create_dir_all(store.series_dir(Timeframe::Minute1)).unwrap();
        fs::write(
            store.canonical_path(&k),
            "time,open,high,low,close,tick_volume,spread,real_volume\n\
             1970-01-01T00:01:00Z,1,1,1,not-a-number,0,0,0\n",
        )
        .unwrap();

        let err = store.read(&k).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
        assert!(err.to_string().contains("EURUSD_M1.csv"));
    }

    #[test]
    fn test_mirror_failure_keeps_canonical() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        let k = key("EURUSD", Timeframe::Minute1);

        // A directory where the mirror should go makes the rename fail.
        fs::create_dir_all(store.mirror_path(&k)).unwrap();

        let err = store.write(&k, &sample()).unwrap_err();
        assert!(err.is_mirror_stale());
        assert_eq!(store.read(&k).unwrap(), Some(sample()));
    }

    #[test]
    fn test_ensure_mirror_repairs_missing_or_outdated_mirror() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        let k = key("EURUSD", Timeframe::Minute1);
        assert!(!store.ensure_mirror(&k).unwrap());

        fs::create_dir_all(store.mirror_path(&k)).unwrap();
        assert!(store.write(&k, &sample()).unwrap_err().is_mirror_stale());
        assert!(store.ensure_mirror(&k).unwrap_err().is_mirror_stale());

        fs::remove_dir(store.mirror_path(&k)).unwrap();
        assert!(store.ensure_mirror(&k).unwrap());
        assert_eq!(store.summary(&k).unwrap().unwrap().mirror, MirrorState::Consistent);
        assert!(!store.ensure_mirror(&k).unwrap());

        let canonical_modified = fs::metadata(store.canonical_path(&k))
            .unwrap()
            .modified()
            .unwrap();
        File::options()
            .write(true)
            .open(store.mirror_path(&k))
            .unwrap()
            .set_modified(canonical_modified - std::time::Duration::from_secs(60))
            .unwrap();
        assert!(store.ensure_mirror(&k).unwrap());
        assert_eq!(store.read_mirror(&k).unwrap(), Some(sample()));
    }

    #[test]
    fn test_summary_and_rebuild() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        let k = key("GBPUSD", Timeframe::Hour4);

        store.write(&k, &sample()).unwrap();
        let summary = store.summary(&k).unwrap().unwrap();
        assert_eq!(summary.bars, 3);
        assert_eq!(summary.first, Some(Utc.timestamp_opt(100, 0).unwrap()));
        assert_eq!(summary.last, Some(Utc.timestamp_opt(300, 0).unwrap()));
        assert_eq!(summary.mirror, MirrorState::Consistent);

        fs::remove_file(store.mirror_path(&k)).unwrap();
        assert_eq!(store.summary(&k).unwrap().unwrap().mirror, MirrorState::Missing);

        fs::write(store.mirror_path(&k), b"not parquet").unwrap();
        assert_eq!(store.summary(&k).unwrap().unwrap().mirror, MirrorState::Stale);

        assert_eq!(store.rebuild_mirror(&k).unwrap(), Some(3));
        assert_eq!(store.summary(&k).unwrap().unwrap().mirror, MirrorState::Consistent);
    }

    #[test]
    fn test_list() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        let a = key("USDJPY", Timeframe::Minute1);
        let b = key("EURUSD", Timeframe::Day1);
        let c = key("EURUSD", Timeframe::Minute1);

        for k in [&a, &b, &c] {
            store.write(k, &sample()).unwrap();
        }
        fs::write(store.series_dir(Timeframe::Minute1).join("notes.txt"), "x").unwrap();

        assert_eq!(store.list().unwrap(), vec![c, b, a]);
    }
}
