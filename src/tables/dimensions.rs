use super::{utf8, StarTable};
use crate::timestamp::{wall_clock_seconds, TimeParts};
use arrow::array::{ArrayRef, Float64Array, Int32Array, TimestampSecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct SongRow {
    pub song_id: String,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<f64>,
}

impl StarTable for SongRow {
    const NAME: &'static str = "songs";
    const DIR_NAME: &'static str = "songs.parquet";
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "artist_id"];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("song_id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("year", DataType::Int32, true),
            Field::new("duration", DataType::Float64, true),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let columns: Vec<ArrayRef> = vec![
            utf8(rows, |r| Some(r.song_id.as_str())),
            utf8(rows, |r| r.title.as_deref()),
            utf8(rows, |r| r.artist_id.as_deref()),
            Arc::new(Int32Array::from(
                rows.iter().map(|r| r.year).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.duration).collect::<Vec<_>>(),
            )),
        ];
        RecordBatch::try_new(Self::schema(), columns)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArtistRow {
    pub artist_id: String,
    pub artist_name: Option<String>,
    pub artist_location: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
}

impl StarTable for ArtistRow {
    const NAME: &'static str = "artists";
    const DIR_NAME: &'static str = "artists.parquet";
    const PARTITION_COLUMNS: &'static [&'static str] = &[];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("artist_id", DataType::Utf8, false),
            Field::new("artist_name", DataType::Utf8, true),
            Field::new("artist_location", DataType::Utf8, true),
            Field::new("artist_latitude", DataType::Float64, true),
            Field::new("artist_longitude", DataType::Float64, true),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let columns: Vec<ArrayRef> = vec![
            utf8(rows, |r| Some(r.artist_id.as_str())),
            utf8(rows, |r| r.artist_name.as_deref()),
            utf8(rows, |r| r.artist_location.as_deref()),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.artist_latitude).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.artist_longitude).collect::<Vec<_>>(),
            )),
        ];
        RecordBatch::try_new(Self::schema(), columns)
    }
}

/// Users keep the raw log column names.
#[derive(Clone, Debug, PartialEq)]
pub struct UserRow {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

impl StarTable for UserRow {
    const NAME: &'static str = "users";
    const DIR_NAME: &'static str = "users.parquet";
    const PARTITION_COLUMNS: &'static [&'static str] = &[];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("userId", DataType::Utf8, false),
            Field::new("firstName", DataType::Utf8, true),
            Field::new("lastName", DataType::Utf8, true),
            Field::new("gender", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let columns: Vec<ArrayRef> = vec![
            utf8(rows, |r| Some(r.user_id.as_str())),
            utf8(rows, |r| r.first_name.as_deref()),
            utf8(rows, |r| r.last_name.as_deref()),
            utf8(rows, |r| r.gender.as_deref()),
            utf8(rows, |r| r.level.as_deref()),
        ];
        RecordBatch::try_new(Self::schema(), columns)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeRow {
    pub start_time: NaiveDateTime,
    pub parts: TimeParts,
}

impl From<NaiveDateTime> for TimeRow {
    fn from(start_time: NaiveDateTime) -> Self {
        TimeRow {
            start_time,
            parts: TimeParts::from(start_time),
        }
    }
}

impl StarTable for TimeRow {
    const NAME: &'static str = "time";
    const DIR_NAME: &'static str = "time.parquet";
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "month"];

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new(
                "start_time",
                DataType::Timestamp(TimeUnit::Second, None),
                false,
            ),
            Field::new("hour", DataType::Int32, false),
            Field::new("day", DataType::Int32, false),
            Field::new("week", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
            Field::new("year", DataType::Int32, false),
            Field::new("weekday", DataType::Int32, false),
        ]))
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let part = |get: fn(&TimeParts) -> i32| -> ArrayRef {
            Arc::new(Int32Array::from(
                rows.iter().map(|r| get(&r.parts)).collect::<Vec<i32>>(),
            ))
        };
        let columns: Vec<ArrayRef> = vec![
            Arc::new(TimestampSecondArray::from(
                rows.iter()
                    .map(|r| wall_clock_seconds(&r.start_time))
                    .collect::<Vec<i64>>(),
            )),
            part(|p| p.hour),
            part(|p| p.day),
            part(|p| p.week),
            part(|p| p.month),
            part(|p| p.year),
            part(|p| p.weekday),
        ];
        RecordBatch::try_new(Self::schema(), columns)
    }
}
