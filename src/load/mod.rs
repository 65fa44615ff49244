// src/load/mod.rs
pub mod header;
pub mod inputs;

use anyhow::{anyhow, bail, Context, Result};
use arrow::{
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use std::{
    fs::File,
    io::{BufReader, Cursor, Read},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};

use crate::config::InputConfig;

pub use header::{normalize_column_name, normalize_headers, read_header};
pub use inputs::resolve_inputs;

/// A CSV dataset held in memory: one partition of batches per input file,
/// all sharing `schema`.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: SchemaRef,
    partitions: Vec<Vec<RecordBatch>>,
    source_files: Vec<PathBuf>,
}

impl Dataset {
    pub fn new(
        schema: SchemaRef,
        partitions: Vec<Vec<RecordBatch>>,
        source_files: Vec<PathBuf>,
    ) -> Self {
        Self {
            schema,
            partitions,
            source_files,
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn partitions(&self) -> &[Vec<RecordBatch>] {
        &self.partitions
    }

    pub fn source_files(&self) -> &[PathBuf] {
        &self.source_files
    }

    pub fn batches(&self) -> impl Iterator<Item = &RecordBatch> {
        self.partitions.iter().flatten()
    }

    pub fn num_rows(&self) -> usize {
        self.batches().map(|b| b.num_rows()).sum()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// Error listing every name in `columns` the dataset does not have.
    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        let missing: Vec<&str> = columns
            .iter()
            .copied()
            .filter(|c| self.schema.field_with_name(c).is_err())
            .collect();
        if !missing.is_empty() {
            bail!(
                "dataset is missing column(s) {:?}; available: {:?}",
                missing,
                self.column_names()
            );
        }
        Ok(())
    }
}

/// All-string schema, used when schema inference is off.
pub fn string_schema(columns: &[String]) -> Schema {
    let fields: Vec<Field> = columns
        .iter()
        .map(|n| Field::new(n, DataType::Utf8, true))
        .collect();
    Schema::new(fields)
}

/// Read every file named by `input.path` into a single [`Dataset`].
#[tracing::instrument(level = "info", skip(input), fields(path = %input.path))]
pub fn load_csv(input: &InputConfig) -> Result<Dataset> {
    let files = resolve_inputs(&input.path)?;

    // all files must agree on the header
    let (first, rest) = files
        .split_first()
        .ok_or_else(|| anyhow!("no input files"))?;
    let columns = column_names_of(first, input)?;
    for file in rest {
        let names = column_names_of(file, input)?;
        if names != columns {
            bail!(
                "header of {} {:?} does not match {} {:?}",
                file.display(),
                names,
                first.display(),
                columns
            );
        }
    }

    let schema = if input.infer_schema {
        infer_schema(&files, &columns, input)?
    } else {
        string_schema(&columns)
    };
    let schema = Arc::new(schema);
    debug!(columns = ?columns, "resolved schema");

    let mut partitions = Vec::with_capacity(files.len());
    for file in &files {
        let batches = read_partition(file, schema.clone(), input)?;
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        info!(file = %file.display(), rows, "loaded");
        partitions.push(batches);
    }

    Ok(Dataset::new(schema, partitions, files))
}

/// Normalized header of `path`, or positional names when it has none.
fn column_names_of(path: &Path, input: &InputConfig) -> Result<Vec<String>> {
    let raw = read_header(path, input.delimiter as u8, input.header)?;
    if input.header {
        Ok(normalize_headers(&raw))
    } else {
        Ok(raw)
    }
}

/// Copy of `path` with every row cut to at most `width` fields, plus the
/// number of rows that were cut.
fn trim_long_rows(path: &Path, delimiter: u8, width: usize) -> Result<(Vec<u8>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .from_writer(Vec::new());

    let mut trimmed = 0;
    for record in reader.byte_records() {
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        if record.len() > width {
            trimmed += 1;
        }
        writer.write_record(record.iter().take(width))?;
    }
    let buf = writer
        .into_inner()
        .map_err(|e| anyhow!("buffering {}: {}", path.display(), e.error()))?;
    Ok((buf, trimmed))
}

/// Rows of `path` as the CSV readers should see them. Extra trailing fields
/// are dropped unless `allow_extra_fields` is off.
fn open_rows(path: &Path, input: &InputConfig, width: usize) -> Result<Box<dyn Read>> {
    if !input.allow_extra_fields {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        return Ok(Box::new(BufReader::new(file)));
    }

    let (buf, trimmed) = trim_long_rows(path, input.delimiter as u8, width)?;
    if trimmed > 0 {
        warn!(file = %path.display(), rows = trimmed, "dropped extra fields");
    }
    Ok(Box::new(Cursor::new(buf)))
}

/// Common type for a column inferred as `a` in one file and `b` in another.
fn widen(a: &DataType, b: &DataType) -> DataType {
    match (a, b) {
        (x, y) if x == y => x.clone(),
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }
        _ => DataType::Utf8,
    }
}

/// Infer column types file by file under our normalized names, then widen
/// them across files. Columns that are empty everywhere stay strings.
fn infer_schema(files: &[PathBuf], columns: &[String], input: &InputConfig) -> Result<Schema> {
    let format = Format::default()
        .with_header(input.header)
        .with_delimiter(input.delimiter as u8)
        .with_quote(b'"')
        .with_truncated_rows(input.allow_truncated_rows);

    let mut types = vec![DataType::Null; columns.len()];
    for file in files {
        let rows = open_rows(file, input, columns.len())?;
        let (inferred, _) = format
            .infer_schema(rows, None)
            .with_context(|| format!("inferring schema of {}", file.display()))?;

        if inferred.fields().len() != columns.len() {
            bail!(
                "inferred {} columns in {} but header has {}",
                inferred.fields().len(),
                file.display(),
                columns.len()
            );
        }
        for (ty, field) in types.iter_mut().zip(inferred.fields()) {
            *ty = widen(ty, field.data_type());
        }
    }

    let fields: Vec<Field> = columns
        .iter()
        .zip(types)
        .map(|(name, ty)| {
            let ty = match ty {
                DataType::Null => DataType::Utf8,
                other => other,
            };
            Field::new(name, ty, true)
        })
        .collect();
    Ok(Schema::new(fields))
}

fn read_partition(path: &Path, schema: SchemaRef, input: &InputConfig) -> Result<Vec<RecordBatch>> {
    let rows = open_rows(path, input, schema.fields().len())?;

    let reader = ReaderBuilder::new(schema)
        .with_header(input.header)
        .with_delimiter(input.delimiter as u8)
        .with_quote(b'"')
        .with_batch_size(input.batch_size)
        .with_truncated_rows(input.allow_truncated_rows)
        .build(rows)
        .context("creating CSV reader")?;

    let mut batches = Vec::new();
    for (idx, batch) in reader.enumerate() {
        let batch =
            batch.with_context(|| format!("reading batch {} of {}", idx, path.display()))?;
        batches.push(batch);
    }
    Ok(batches)
}
