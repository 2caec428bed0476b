//! Ordered bar series and the merge/dedup engine.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::Bar;

/// Counts of what a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Bars whose timestamp was not present before.
    pub added: usize,
    /// Existing bars replaced by an incoming bar with different values.
    pub revised: usize,
}

impl MergeStats {
    /// Returns true if the merge changed the series content.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.added > 0 || self.revised > 0
    }
}

impl std::ops::AddAssign for MergeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.added += rhs.added;
        self.revised += rhs.revised;
    }
}

/// Bars of one `(symbol, timeframe)` pair.
///
/// Bars are kept in ascending timestamp order and timestamps are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Creates an empty series.
    #[must_use]
    pub const fn new() -> Self {
        Self { bars: Vec::new() }
    }

    /// Builds a series from bars in any order.
    ///
    /// When several bars share a timestamp the last one in input order is kept.
    #[must_use]
    pub fn from_bars(bars: impl IntoIterator<Item = Bar>) -> Self {
        Self {
            bars: normalize(bars),
        }
    }

    /// Returns the bars in ascending timestamp order.
    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Consumes the series, returning its bars in ascending order.
    #[must_use]
    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    /// Returns the number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Returns true if the series holds no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Returns the earliest bar.
    #[must_use]
    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    /// Returns the latest bar.
    #[must_use]
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Returns the latest archived timestamp.
    #[must_use]
    pub fn checkpoint(&self) -> Option<DateTime<Utc>> {
        self.last().map(|bar| bar.timestamp)
    }

    /// Merges `incoming` into the series.
    ///
    /// An incoming bar replaces a stored bar with the same timestamp. Merging
    /// bars that are already present with identical values is a no-op.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = Bar>) -> MergeStats {
        let incoming = normalize(incoming);
        let mut stats = MergeStats::default();

        let Some(first_incoming) = incoming.first().map(|bar| bar.timestamp) else {
            return stats;
        };

        // Fast path: the chunk lies entirely after what is stored.
        if self.checkpoint().is_none_or(|last| last < first_incoming) {
            stats.added = incoming.len();
            self.bars.extend(incoming);
            return stats;
        }

        let split = self.bars.partition_point(|bar| bar.timestamp < first_incoming);
        let tail = self.bars.split_off(split);
        let mut merged = Vec::with_capacity(tail.len() + incoming.len());

        let (mut i, mut j) = (0, 0);
        while i < tail.len() && j < incoming.len() {
            let (old, new) = (tail[i], incoming[j]);
            match old.timestamp.cmp(&new.timestamp) {
                Ordering::Less => {
                    merged.push(old);
                    i += 1;
                }
                Ordering::Greater => {
                    merged.push(new);
                    stats.added += 1;
                    j += 1;
                }
                Ordering::Equal => {
                    if old != new {
                        stats.revised += 1;
                    }
                    merged.push(new);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&tail[i..]);
        stats.added += incoming.len() - j;
        merged.extend_from_slice(&incoming[j..]);

        self.bars.extend(merged);
        stats
    }
}

/// Merges `incoming` into `existing`, incoming bars winning on equal timestamps.
#[must_use]
pub fn merge(mut existing: Series, incoming: impl IntoIterator<Item = Bar>) -> Series {
    existing.merge(incoming);
    existing
}

/// Sorts ascending and keeps the last bar of every run of equal timestamps.
fn normalize(bars: impl IntoIterator<Item = Bar>) -> Vec<Bar> {
    let mut bars: Vec<Bar> = bars.into_iter().collect();
    // Stable sort keeps input order within equal timestamps.
    bars.sort_by_key(|bar| bar.timestamp);

    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(secs: i64, close: f64) -> Bar {
        let timestamp = Utc.timestamp_opt(secs, 0).unwrap();
        Bar::new(timestamp, close, close, close, close).with_volumes(1, 0, 0)
    }

    fn timestamps(series: &Series) -> Vec<i64> {
        series.bars().iter().map(|b| b.timestamp.timestamp()).collect()
    }

    #[test]
    fn test_from_bars_sorts_and_keeps_last_duplicate() {
        let series = Series::from_bars([bar(300, 3.0), bar(100, 1.0), bar(300, 3.5)]);
        assert_eq!(timestamps(&series), vec![100, 300]);
        assert_eq!(series.last().unwrap().close, 3.5);
    }

    #[test]
    fn test_merge_into_empty() {
        let mut series = Series::new();
        let stats = series.merge([bar(100, 1.0), bar(200, 2.0), bar(300, 3.0)]);
        assert_eq!(stats, MergeStats { added: 3, revised: 0 });
        assert_eq!(series.checkpoint().unwrap().timestamp(), 300);
    }

    #[test]
    fn test_incoming_wins_on_duplicate_timestamp() {
        let mut series = Series::from_bars([bar(100, 1.0), bar(200, 2.0)]);
        let stats = series.merge([bar(200, 2.5), bar(300, 3.0)]);

        assert_eq!(stats, MergeStats { added: 1, revised: 1 });
        assert_eq!(timestamps(&series), vec![100, 200, 300]);
        assert_eq!(series.bars()[1].close, 2.5);
    }

    #[test]
    fn test_later_chunk_wins_over_earlier_chunk() {
        let first = merge(Series::new(), [bar(100, 1.0), bar(200, 2.0)]);
        let second = merge(first, [bar(200, 9.0)]);

        let at_200: Vec<_> = second
            .bars()
            .iter()
            .filter(|b| b.timestamp.timestamp() == 200)
            .collect();
        assert_eq!(at_200.len(), 1);
        assert_eq!(at_200[0].close, 9.0);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let original = Series::from_bars([bar(100, 1.0), bar(200, 2.0), bar(300, 3.0)]);
        let mut merged = original.clone();
        let stats = merged.merge(original.bars().iter().copied());

        assert!(!stats.changed());
        assert_eq!(merged, original);
    }

    #[test]
    fn test_merge_interleaved_backfill() {
        let mut series = Series::from_bars([bar(100, 1.0), bar(300, 3.0), bar(500, 5.0)]);
        let stats = series.merge([bar(200, 2.0), bar(400, 4.0), bar(600, 6.0)]);

        assert_eq!(stats, MergeStats { added: 3, revised: 0 });
        assert_eq!(timestamps(&series), vec![100, 200, 300, 400, 500, 600]);
    }

    #[test]
    fn test_merge_empty_incoming() {
        let mut series = Series::from_bars([bar(100, 1.0)]);
        let stats = series.merge(Vec::new());
        assert_eq!(stats, MergeStats::default());
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_merge_stats_accumulate() {
        let mut total = MergeStats::default();
        total += MergeStats { added: 2, revised: 0 };
        total += MergeStats { added: 1, revised: 1 };
        assert_eq!(total, MergeStats { added: 3, revised: 1 });
        assert!(total.changed());
    }
}
