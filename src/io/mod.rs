// src/io/mod.rs
//
// Loading the raw CSV into one table and writing the cleaned table out.

use crate::config::OutputFormat;
use crate::process::schema;
use anyhow::{Context, Result};
use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder, WriterBuilder},
    record_batch::RecordBatch,
};
use parquet::arrow::ArrowWriter;
use parquet::basic::{BrotliLevel, Compression};
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const BATCH_ROWS: usize = 65_536;

/// Read a headered CSV into a single batch. Types are inferred over the
/// whole file, then overridden by [`schema::read_schema`].
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let path = path.as_ref();
    let mut file =
        File::open(path).with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let format = Format::default().with_header(true);
    let (inferred, sampled) = format
        .infer_schema(&mut file, None)
        .with_context(|| format!("Failed to infer schema of {}", path.display()))?;
    debug!(sampled, fields = inferred.fields().len(), "inferred schema");
    file.rewind()?;

    let read_schema = Arc::new(schema::read_schema(&inferred));
    let missing = schema::missing_required(&read_schema);
    if !missing.is_empty() {
        anyhow::bail!(
            "{} is missing required columns: {}",
            path.display(),
            missing.join(", ")
        );
    }

    let reader = ReaderBuilder::new(read_schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_ROWS)
        .build(file)
        .context("creating CSV reader")?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("CSV parse error in {}", path.display()))?;
    let batch = concat_batches(&read_schema, &batches).context("concatenating CSV batches")?;

    info!(rows = batch.num_rows(), columns = batch.num_columns(), "loaded");
    Ok(batch)
}

/// Write `batch` as Parquet, via a temporary file renamed into place.
pub fn write_parquet<P: AsRef<Path>>(batch: &RecordBatch, path: P) -> Result<()> {
    let out_path = path.as_ref();
    let temp_path = out_path.with_extension("tmp");

    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .set_dictionary_enabled(true)
        .build();

    let file = File::create(&temp_path)
        .with_context(|| format!("Failed to create {}", temp_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("opening parquet writer")?;
    writer.write(batch).context("writing parquet rows")?;
    writer.close().context("closing parquet writer")?;

    fs::rename(&temp_path, out_path).with_context(|| {
        format!(
            "Failed to move {} to {}",
            temp_path.display(),
            out_path.display()
        )
    })?;
    debug!(path = %out_path.display(), rows = batch.num_rows(), "wrote parquet");
    Ok(())
}

/// Write `batch` as a headered CSV.
pub fn write_csv<P: AsRef<Path>>(batch: &RecordBatch, path: P) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer
        .write(batch)
        .with_context(|| format!("Failed to write CSV {}", path.display()))?;
    writer
        .into_inner()
        .flush()
        .with_context(|| format!("Failed to flush CSV {}", path.display()))?;
    debug!(path = %path.display(), rows = batch.num_rows(), "wrote csv");
    Ok(())
}

pub fn write_table<P: AsRef<Path>>(batch: &RecordBatch, path: P, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Parquet => write_parquet(batch, path),
        OutputFormat::Csv => write_csv(batch, path),
    }
}
