//! Star-schema output tables and their columnar form.

mod dimensions;
mod songplays;

pub use dimensions::{ArtistRow, SongRow, TimeRow, UserRow};
pub use songplays::SongplayRow;

use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

/// A table of the star schema.
pub trait StarTable: Sized {
    /// Table name, also used in logs.
    const NAME: &'static str;
    /// Directory name under the output root.
    const DIR_NAME: &'static str;
    /// Columns used for Hive-style partitioning, outermost first.
    const PARTITION_COLUMNS: &'static [&'static str];

    fn schema() -> SchemaRef;

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError>;
}

/// Collects an optional string column.
fn utf8<T>(rows: &[T], get: impl Fn(&T) -> Option<&str>) -> arrow::array::ArrayRef {
    std::sync::Arc::new(arrow::array::StringArray::from(
        rows.iter().map(get).collect::<Vec<Option<&str>>>(),
    ))
}
