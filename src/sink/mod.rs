//! Table sink: one directory per table, Parquet data files, optional
//! Hive-style `column=value` partition directories.
//!
//! A write is staged in a hidden sibling directory and renamed into place
//! once every file is flushed, so a failed run never leaves a half-written
//! table behind.

mod partition;

pub use partition::{escape_partition_value, unescape_partition_value, NULL_PARTITION};

use crate::error::{EtlError, EtlResult};
use arrow::array::{ArrayRef, Int32Array, StringArray};
use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use clap::ValueEnum;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::ZstdLevel;
use parquet::file::properties::WriterProperties;
use partition::{parse_segment, split_by_partition};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Marker file written into a table directory after a complete write.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

const DATA_FILE: &str = "part-00000.parquet";

/// What to do when the target table directory already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Replace the existing table.
    #[default]
    Overwrite,
    /// Fail the run.
    ErrorIfExists,
    /// Leave the existing table untouched.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Snappy,
    Zstd,
    None,
}

impl From<Compression> for parquet::basic::Compression {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Snappy => parquet::basic::Compression::SNAPPY,
            Compression::Zstd => parquet::basic::Compression::ZSTD(ZstdLevel::default()),
            Compression::None => parquet::basic::Compression::UNCOMPRESSED,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub mode: WriteMode,
    pub compression: Compression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { files: usize, rows: usize },
    /// Target existed and the mode was [`WriteMode::Ignore`].
    Skipped,
}

/// Writes `batch` as a table directory at `target`.
///
/// With partition columns, rows are grouped into `col=value/...` directories
/// and the partition columns are left out of the data files. Null partition
/// values go to [`NULL_PARTITION`].
pub fn write_table(
    batch: &RecordBatch,
    target: &Path,
    partition_columns: &[&str],
    options: WriteOptions,
) -> EtlResult<WriteOutcome> {
    if target.exists() {
        match options.mode {
            WriteMode::ErrorIfExists => {
                return Err(EtlError::write(target, "table already exists"));
            }
            WriteMode::Ignore => {
                info!("Table {:?} already exists, skipping write", target);
                return Ok(WriteOutcome::Skipped);
            }
            WriteMode::Overwrite => {}
        }
    }

    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| EtlError::write(parent, e))?;
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| EtlError::write(target, "target has no directory name"))?;

    let staging = tempfile::Builder::new()
        .prefix(&format!(".{}-staging-", name))
        .tempdir_in(parent)
        .map_err(|e| EtlError::write(parent, e))?;

    let files = write_files(batch, staging.path(), partition_columns, options.compression)?;
    let marker = staging.path().join(SUCCESS_MARKER);
    File::create(&marker).map_err(|e| EtlError::write(&marker, e))?;

    commit(staging, target, parent, &name)?;
    debug!(
        "Wrote {} rows in {} files to {:?}",
        batch.num_rows(),
        files,
        target
    );
    Ok(WriteOutcome::Written {
        files,
        rows: batch.num_rows(),
    })
}

fn write_files(
    batch: &RecordBatch,
    dir: &Path,
    partition_columns: &[&str],
    compression: Compression,
) -> EtlResult<usize> {
    if partition_columns.is_empty() {
        write_parquet(&dir.join(DATA_FILE), batch, compression)?;
        return Ok(1);
    }

    let slices = split_by_partition(batch, partition_columns)?;
    for slice in &slices {
        let partition_dir = dir.join(&slice.dir);
        fs::create_dir_all(&partition_dir).map_err(|e| EtlError::write(&partition_dir, e))?;
        write_parquet(&partition_dir.join(DATA_FILE), &slice.batch, compression)?;
    }
    Ok(slices.len())
}

fn write_parquet(path: &Path, batch: &RecordBatch, compression: Compression) -> EtlResult<()> {
    let file = File::create(path).map_err(|e| EtlError::write(path, e))?;
    let props = WriterProperties::builder()
        .set_compression(compression.into())
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| EtlError::write(path, e))?;
    writer.write(batch).map_err(|e| EtlError::write(path, e))?;
    writer.close().map_err(|e| EtlError::write(path, e))?;
    Ok(())
}

/// Swaps the staged directory in for `target`. The previous table, if any,
/// is moved aside first and restored when the final rename fails.
fn commit(staging: TempDir, target: &Path, parent: &Path, name: &str) -> EtlResult<()> {
    let previous = if target.exists() {
        let trash = tempfile::Builder::new()
            .prefix(&format!(".{}-old-", name))
            .tempdir_in(parent)
            .map_err(|e| EtlError::write(parent, e))?;
        let old = trash.path().join(name);
        fs::rename(target, &old).map_err(|e| EtlError::write(target, e))?;
        Some((trash, old))
    } else {
        None
    };

    let staged = staging.keep();
    if let Err(e) = fs::rename(&staged, target) {
        let _ = fs::remove_dir_all(&staged);
        return Err(match previous {
            Some((trash, old)) => restore_previous(trash, &old, target, e),
            None => EtlError::write(target, e),
        });
    }
    Ok(())
}

/// Moves the previous table back after a failed swap. When that fails too the
/// trash directory is kept and its location reported.
fn restore_previous(trash: TempDir, old: &Path, target: &Path, cause: io::Error) -> EtlError {
    match fs::rename(old, target) {
        Ok(()) => EtlError::write(target, cause),
        Err(restore) => {
            let kept = trash.keep().join(old.file_name().unwrap_or_default());
            warn!("Could not restore previous table {:?}: {}", target, restore);
            EtlError::write(
                target,
                format!("{}; previous table kept at {:?} ({})", cause, kept, restore),
            )
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.') || s.starts_with('_'))
            .unwrap_or(false)
}

/// Partition values encoded in the directories between `root` and `file`.
fn partition_values(root: &Path, file: &Path) -> HashMap<String, Option<String>> {
    file.parent()
        .and_then(|dir| dir.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .filter_map(|c| parse_segment(&c.as_os_str().to_string_lossy()))
                .collect()
        })
        .unwrap_or_default()
}

fn partition_array(
    data_type: &DataType,
    value: Option<&str>,
    len: usize,
) -> Result<ArrayRef, ArrowError> {
    match data_type {
        DataType::Int32 => {
            let parsed = value
                .map(|v| {
                    v.parse::<i32>().map_err(|e| {
                        ArrowError::ParseError(format!("partition value '{}': {}", v, e))
                    })
                })
                .transpose()?;
            Ok(Arc::new(Int32Array::from(vec![parsed; len])))
        }
        DataType::Utf8 => Ok(Arc::new(StringArray::from(vec![value; len]))),
        other => Err(ArrowError::NotYetImplemented(format!(
            "partition column of type {}",
            other
        ))),
    }
}

fn restore_partitions(
    schema: &SchemaRef,
    batch: &RecordBatch,
    partitions: &HashMap<String, Option<String>>,
) -> Result<RecordBatch, ArrowError> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| match partitions.get(field.name()) {
            Some(value) => partition_array(field.data_type(), value.as_deref(), batch.num_rows()),
            None => batch.column_by_name(field.name()).cloned().ok_or_else(|| {
                ArrowError::SchemaError(format!("column '{}' missing from data file", field.name()))
            }),
        })
        .collect::<Result<Vec<ArrayRef>, ArrowError>>()?;
    RecordBatch::try_new(schema.clone(), columns)
}

/// Reads a table directory written by [`write_table`] back into one batch.
///
/// Partition columns are rebuilt from the directory names. Rows come back
/// grouped by partition, in directory order.
pub fn read_table(target: &Path, schema: SchemaRef) -> EtlResult<RecordBatch> {
    if !target.is_dir() {
        return Err(EtlError::source_read(target, "table directory does not exist"));
    }

    let mut batches = Vec::new();
    for entry in WalkDir::new(target)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.map_err(|e| EtlError::source_read(target, e))?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().map_or(true, |ext| ext != "parquet")
        {
            continue;
        }

        let partitions = partition_values(target, path);
        let file = File::open(path).map_err(|e| EtlError::source_read(path, e))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .and_then(|builder| builder.build())
            .map_err(|e| EtlError::source_read(path, e))?;
        for batch in reader {
            let batch = batch.map_err(|e| EtlError::source_read(path, e))?;
            let restored = restore_partitions(&schema, &batch, &partitions)
                .map_err(|e| EtlError::source_read(path, e))?;
            batches.push(restored);
        }
    }
    Ok(concat_batches(&schema, &batches)?)
}
