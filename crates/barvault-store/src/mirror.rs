//! Columnar Parquet mirror.

use arrow::array::{
    Array, AsArray, Float64Array, PrimitiveArray, TimestampSecondArray, UInt64Array,
};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Field, Float64Type, Schema, TimeUnit, TimestampSecondType,
    UInt64Type,
};
use arrow::record_batch::RecordBatch;
use barvault_types::Bar;
use chrono::{TimeZone, Utc};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use crate::{FormatError, SeriesFormat, StoreConfig};

/// Parquet codec for the mirror file.
#[derive(Debug, Clone)]
pub struct ParquetFormat {
    /// Row group size (number of rows per group).
    row_group_size: usize,
    /// Compression codec.
    compression: Compression,
}

impl Default for ParquetFormat {
    fn default() -> Self {
        let config = StoreConfig::default();
        Self {
            row_group_size: config.row_group_size,
            compression: config.compression,
        }
    }
}

impl ParquetFormat {
    /// Creates a new Parquet codec with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Parquet codec using the store's tuning.
    #[must_use]
    pub const fn from_config(config: &StoreConfig) -> Self {
        Self {
            row_group_size: config.row_group_size,
            compression: config.compression,
        }
    }

    /// Creates the Arrow schema for bar data.
    fn schema() -> Schema {
        Schema::new(vec![
            Field::new(
                "time",
                DataType::Timestamp(TimeUnit::Second, Some("UTC".into())),
                false,
            ),
            Field::new("open", DataType::Float64, false),
            Field::new("high", DataType::Float64, false),
            Field::new("low", DataType::Float64, false),
            Field::new("close", DataType::Float64, false),
            Field::new("tick_volume", DataType::UInt64, false),
            Field::new("spread", DataType::UInt64, false),
            Field::new("real_volume", DataType::UInt64, false),
        ])
    }

    /// Converts bars to an Arrow RecordBatch.
    fn bars_to_batch(bars: &[Bar]) -> Result<RecordBatch, FormatError> {
        let times: Vec<_> = bars.iter().map(|b| b.timestamp.timestamp()).collect();
        let opens: Vec<_> = bars.iter().map(|b| b.open).collect();
        let highs: Vec<_> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<_> = bars.iter().map(|b| b.low).collect();
        let closes: Vec<_> = bars.iter().map(|b| b.close).collect();
        let tick_volumes: Vec<_> = bars.iter().map(|b| b.tick_volume).collect();
        let spreads: Vec<_> = bars.iter().map(|b| b.spread).collect();
        let real_volumes: Vec<_> = bars.iter().map(|b| b.real_volume).collect();

        RecordBatch::try_new(
            Arc::new(Self::schema()),
            vec![
                Arc::new(TimestampSecondArray::from(times).with_timezone("UTC")),
                Arc::new(Float64Array::from(opens)),
                Arc::new(Float64Array::from(highs)),
                Arc::new(Float64Array::from(lows)),
                Arc::new(Float64Array::from(closes)),
                Arc::new(UInt64Array::from(tick_volumes)),
                Arc::new(UInt64Array::from(spreads)),
                Arc::new(UInt64Array::from(real_volumes)),
            ],
        )
        .map_err(|e| FormatError::Parquet(e.to_string()))
    }

    /// Converts one RecordBatch back to bars, appending to `out`.
    fn batch_to_bars(batch: &RecordBatch, offset: u64, out: &mut Vec<Bar>) -> Result<(), FormatError> {
        let times = column::<TimestampSecondType>(batch, "time")?;
        let opens = column::<Float64Type>(batch, "open")?;
        let highs = column::<Float64Type>(batch, "high")?;
        let lows = column::<Float64Type>(batch, "low")?;
        let closes = column::<Float64Type>(batch, "close")?;
        let tick_volumes = column::<UInt64Type>(batch, "tick_volume")?;
        let spreads = column::<UInt64Type>(batch, "spread")?;
        let real_volumes = column::<UInt64Type>(batch, "real_volume")?;

        out.reserve(batch.num_rows());
        for i in 0..batch.num_rows() {
            let record = offset + i as u64 + 1;
            if times.is_null(i) {
                return Err(FormatError::InvalidRecord {
                    record,
                    message: "null time".to_string(),
                });
            }
            let secs = times.value(i);
            let timestamp = Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
                FormatError::InvalidRecord {
                    record,
                    message: format!("time {secs} out of range"),
                }
            })?;
            out.push(
                Bar::new(
                    timestamp,
                    opens.value(i),
                    highs.value(i),
                    lows.value(i),
                    closes.value(i),
                )
                .with_volumes(tick_volumes.value(i), spreads.value(i), real_volumes.value(i)),
            );
        }
        Ok(())
    }
}

fn column<'a, T: ArrowPrimitiveType>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a PrimitiveArray<T>, FormatError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_primitive_opt::<T>())
        .ok_or_else(|| FormatError::Parquet(format!("missing or mistyped column '{name}'")))
}

impl SeriesFormat for ParquetFormat {
    fn write_bars<W: Write + Send>(&self, bars: &[Bar], writer: W) -> Result<(), FormatError> {
        let schema = Arc::new(Self::schema());
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut arrow_writer = ArrowWriter::try_new(writer, schema, Some(props))
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        for chunk in bars.chunks(self.row_group_size.max(1)) {
            let batch = Self::bars_to_batch(chunk)?;
            arrow_writer
                .write(&batch)
                .map_err(|e| FormatError::Parquet(e.to_string()))?;
        }

        arrow_writer
            .close()
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        Ok(())
    }

    fn read_bars(&self, file: File) -> Result<Vec<Bar>, FormatError> {
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .and_then(|builder| builder.build())
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        let mut bars = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| FormatError::Parquet(e.to_string()))?;
            let offset = bars.len() as u64;
            Self::batch_to_bars(&batch, offset, &mut bars)?;
        }
        Ok(bars)
    }

    fn extension(&self) -> &'static str {
        "parquet"
    }
}
