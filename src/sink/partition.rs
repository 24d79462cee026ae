//! Hive-style partition directory naming.

use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Directory value used for a null partition value.
pub const NULL_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

fn needs_escape(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '{' | '[' | ']' | '^'
        )
}

pub fn escape_partition_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverses [`escape_partition_value`]. Malformed escapes are kept verbatim.
pub fn unescape_partition_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

fn partition_value(column: &ArrayRef, row: usize) -> Result<String, ArrowError> {
    if column.is_null(row) {
        return Ok(NULL_PARTITION.to_string());
    }
    Ok(escape_partition_value(&array_value_to_string(column.as_ref(), row)?))
}

/// Parses one `column=value` directory name. `None` for anything else.
pub fn parse_segment(segment: &str) -> Option<(String, Option<String>)> {
    let (column, value) = segment.split_once('=')?;
    let value = if value == NULL_PARTITION {
        None
    } else {
        Some(unescape_partition_value(value))
    };
    Some((column.to_string(), value))
}

/// One partition's rows, without the partition columns.
pub struct PartitionSlice {
    pub dir: PathBuf,
    pub batch: RecordBatch,
}

/// Groups the rows of `batch` by the values of `partition_columns`.
///
/// Slices come out ordered by directory path. Partition columns are removed
/// from each slice.
pub fn split_by_partition(
    batch: &RecordBatch,
    partition_columns: &[&str],
) -> Result<Vec<PartitionSlice>, ArrowError> {
    let schema = batch.schema();
    let partition_indices = partition_columns
        .iter()
        .map(|c| schema.index_of(c))
        .collect::<Result<Vec<usize>, ArrowError>>()?;
    let data_indices: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !partition_indices.contains(i))
        .collect();
    let data = batch.project(&data_indices)?;

    let mut groups: BTreeMap<PathBuf, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let mut dir = PathBuf::new();
        for (name, &index) in partition_columns.iter().zip(&partition_indices) {
            let value = partition_value(batch.column(index), row)?;
            dir.push(format!("{}={}", name, value));
        }
        groups.entry(dir).or_default().push(row as u32);
    }

    groups
        .into_iter()
        .map(|(dir, rows)| {
            let indices = UInt32Array::from(rows);
            let columns = data
                .columns()
                .iter()
                .map(|c| arrow::compute::take(c.as_ref(), &indices, None))
                .collect::<Result<Vec<ArrayRef>, ArrowError>>()?;
            Ok(PartitionSlice {
                dir,
                batch: RecordBatch::try_new(data.schema(), columns)?,
            })
        })
        .collect()
}
