// src/write/mod.rs

use anyhow::{Context, Result};
use arrow::{
    csv::WriterBuilder,
    datatypes::SchemaRef,
    record_batch::RecordBatch,
};
use datafusion::physical_plan::SendableRecordBatchStream;
use futures::StreamExt;
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

/// Sibling temp path used while a file is being written.
fn tmp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".into());
    path.with_file_name(format!(".{}.tmp", name))
}

fn prepare_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Write to a temp file then rename over `path`, so readers never see a
/// half-written file.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    prepare_parent(path)?;
    let tmp = tmp_path_for(path);
    let file =
        File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;

    if let Err(e) = write(file) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

/// Write `batches` as CSV with a header row. An empty result still gets its
/// header.
pub fn write_csv(
    path: &Path,
    schema: SchemaRef,
    batches: &[RecordBatch],
    delimiter: u8,
) -> Result<u64> {
    let mut rows = 0u64;
    write_atomically(path, |file| {
        let mut writer = WriterBuilder::new()
            .with_header(true)
            .with_delimiter(delimiter)
            .build(BufWriter::new(file));

        if batches.is_empty() {
            writer.write(&RecordBatch::new_empty(schema.clone()))?;
        }
        for batch in batches {
            writer.write(batch).context("writing CSV batch")?;
            rows += batch.num_rows() as u64;
        }
        writer.into_inner().flush()?;
        Ok(())
    })?;

    info!(path = %path.display(), rows, "wrote csv");
    Ok(rows)
}

/// Stream query output straight to CSV without collecting it first.
pub async fn write_stream_csv(
    path: &Path,
    stream: SendableRecordBatchStream,
    delimiter: u8,
) -> Result<u64> {
    prepare_parent(path)?;
    let tmp = tmp_path_for(path);
    let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;

    let rows = match stream_into(file, stream, delimiter).await {
        Ok(rows) => rows,
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
    };

    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
    info!(path = %path.display(), rows, "wrote csv");
    Ok(rows)
}

async fn stream_into(
    file: File,
    mut stream: SendableRecordBatchStream,
    delimiter: u8,
) -> Result<u64> {
    let schema = stream.schema();
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .with_delimiter(delimiter)
        .build(BufWriter::new(file));

    let mut rows = 0u64;
    let mut wrote_any = false;
    while let Some(batch) = stream.next().await {
        let batch = batch.context("executing query for CSV output")?;
        writer.write(&batch).context("writing CSV batch")?;
        rows += batch.num_rows() as u64;
        wrote_any = true;
    }
    if !wrote_any {
        writer.write(&RecordBatch::new_empty(schema))?;
    }
    writer.into_inner().flush()?;
    Ok(rows)
}

/// Write `batches` to a Brotli-compressed Parquet file, returning its size.
pub fn write_parquet(path: &Path, schema: SchemaRef, batches: &[RecordBatch]) -> Result<u64> {
    write_atomically(path, |file| {
        let props = WriterProperties::builder()
            .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))
            .context("creating parquet writer")?;
        for batch in batches {
            writer.write(batch).context("writing batch to parquet")?;
        }
        writer.close().context("closing parquet writer")?;
        Ok(())
    })?;

    let size = fs::metadata(path)
        .context("getting file metadata")?
        .len();
    info!(path = %path.display(), bytes = size, "wrote parquet");
    Ok(size)
}
