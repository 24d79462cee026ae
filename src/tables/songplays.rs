use super::{utf8, StarTable};
use crate::timestamp::wall_clock_seconds;
use arrow::array::{ArrayRef, Int32Array, Int64Array, TimestampSecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use std::sync::Arc;

/// One play of a song, joined to the song metadata by artist name.
#[derive(Clone, Debug, PartialEq)]
pub struct SongplayRow {
    pub songplay_id: i64,
    pub start_time: NaiveDateTime,
    pub month: i32,
    pub year: i32,
    pub user_id: Option<String>,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl StarTable for SongplayRow {
    const NAME: &'static str = "songplays";
    const DIR_NAME: &'static str = "songplays.parquet";
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "month"];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("songplay_id", DataType::Int64, false),
            Field::new(
                "start_time",
                DataType::Timestamp(TimeUnit::Second, None),
                false,
            ),
            Field::new("month", DataType::Int32, false),
            Field::new("year", DataType::Int32, false),
            Field::new("user_id", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
            Field::new("song_id", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("session_id", DataType::Int64, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("user_agent", DataType::Utf8, true),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.songplay_id).collect::<Vec<i64>>(),
            )),
            Arc::new(TimestampSecondArray::from(
                rows.iter()
                    .map(|r| wall_clock_seconds(&r.start_time))
                    .collect::<Vec<i64>>(),
            )),
            Arc::new(Int32Array::from(
                rows.iter().map(|r| r.month).collect::<Vec<i32>>(),
            )),
            Arc::new(Int32Array::from(
                rows.iter().map(|r| r.year).collect::<Vec<i32>>(),
            )),
            utf8(rows, |r| r.user_id.as_deref()),
            utf8(rows, |r| r.level.as_deref()),
            utf8(rows, |r| r.song_id.as_deref()),
            utf8(rows, |r| r.artist_id.as_deref()),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.session_id).collect::<Vec<Option<i64>>>(),
            )),
            utf8(rows, |r| r.location.as_deref()),
            utf8(rows, |r| r.user_agent.as_deref()),
        ];
        RecordBatch::try_new(Self::schema(), columns)
    }
}
