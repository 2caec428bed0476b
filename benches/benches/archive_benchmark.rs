//! Archive benchmarks: merge, store round trips and a full sync.
//!
//! Run with: `cargo bench --package barvault-bench`

use barvault_bench::{SyntheticProvider, synthetic_bars};
use barvault_lib::{
    ChunkPolicy, FreshnessPolicy, Series, SeriesKey, SeriesStore, SyncConfig, Synchronizer,
    Timeframe,
};
use chrono::{DateTime, TimeDelta, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use tempfile::TempDir;

const SIZES: [usize; 3] = [10_000, 100_000, 500_000];

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_325_376_000, 0).unwrap()
}

fn merge_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in SIZES {
        let bars = synthetic_bars(start(), Timeframe::Minute1, size + size / 10);
        let stored = Series::from_bars(bars[..size].to_vec());
        group.throughput(Throughput::Elements(size as u64));

        // New chunk strictly after the stored bars.
        let tail = bars[size..].to_vec();
        group.bench_with_input(BenchmarkId::new("append", size), &tail, |b, tail| {
            b.iter_batched(
                || stored.clone(),
                |mut series| black_box(series.merge(tail.iter().copied())),
                criterion::BatchSize::LargeInput,
            );
        });

        // Chunk that revisits the last tenth of the stored bars.
        let overlap = bars[size - size / 10..].to_vec();
        group.bench_with_input(BenchmarkId::new("overlap", size), &overlap, |b, overlap| {
            b.iter_batched(
                || stored.clone(),
                |mut series| black_box(series.merge(overlap.iter().copied())),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn store_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    group.sample_size(10);

    let key = SeriesKey::new("SYNTH", Timeframe::Minute1).unwrap();
    for size in SIZES {
        let series = Series::from_bars(synthetic_bars(start(), Timeframe::Minute1, size));
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("write", size), &series, |b, series| {
            let temp_dir = TempDir::new().unwrap();
            let store = SeriesStore::new(temp_dir.path());
            b.iter(|| store.write(&key, series).unwrap());
        });

        let temp_dir = TempDir::new().unwrap();
        let store = SeriesStore::new(temp_dir.path());
        store.write(&key, &series).unwrap();

        group.bench_function(BenchmarkId::new("read_csv", size), |b| {
            b.iter(|| black_box(store.read(&key).unwrap()));
        });
        group.bench_function(BenchmarkId::new("read_parquet", size), |b| {
            b.iter(|| black_box(store.read_mirror(&key).unwrap()));
        });
    }

    group.finish();
}

fn sync_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("sync");
    group.sample_size(10);

    let size = 100_000;
    let history = synthetic_bars(start(), Timeframe::Minute1, size);
    let target_end = history[size - 1].timestamp;
    let provider = Arc::new(SyntheticProvider::new(history));
    let config = SyncConfig::default()
        .with_epoch(start())
        .with_chunk_policy(ChunkPolicy::Fixed(TimeDelta::days(7)))
        .with_freshness(FreshnessPolicy::Disabled);

    group.throughput(Throughput::Elements(size as u64));
    group.bench_function("initial_sync_m1", |b| {
        b.to_async(&runtime).iter_batched(
            || {
                let temp_dir = TempDir::new().unwrap();
                let store = SeriesStore::new(temp_dir.path());
                let sync = Synchronizer::new(Arc::clone(&provider), store, config.clone());
                (temp_dir, sync)
            },
            |(_temp_dir, sync)| async move {
                black_box(sync.sync("SYNTH", "M1", target_end).await.unwrap())
            },
            criterion::BatchSize::PerIteration,
        );
    });

    group.finish();
}

criterion_group!(benches, merge_benchmark, store_benchmark, sync_benchmark);
criterion_main!(benches);
