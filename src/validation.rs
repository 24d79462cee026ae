//! Shape checks for produced tables.
//!
//! Run before a table is handed to the writer, so a broken invariant aborts
//! the run instead of landing on disk.

use crate::tables::{ArtistRow, SongRow, SongplayRow, StarTable, TimeRow, UserRow};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// Validation error types
#[derive(Debug)]
pub enum ValidationError {
    DuplicateKey {
        field: &'static str,
        key: String,
    },
    NonIncreasingId {
        field: &'static str,
        previous: i64,
        current: i64,
    },
    MissingJoinKey {
        field: &'static str,
        row: usize,
    },
    UnknownPartitionColumn {
        column: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateKey { field, key } => {
                write!(f, "Key '{}' has duplicate value '{}'", field, key)
            }
            ValidationError::NonIncreasingId {
                field,
                previous,
                current,
            } => write!(
                f,
                "Field '{}' must strictly increase, got {} after {}",
                field, current, previous
            ),
            ValidationError::MissingJoinKey { field, row } => {
                write!(f, "Joined field '{}' is null in row {}", field, row)
            }
            ValidationError::UnknownPartitionColumn { column } => {
                write!(f, "Partition column '{}' is not in the schema", column)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

fn validate_unique<'a, T, K: Eq + Hash + fmt::Display>(
    rows: &'a [T],
    field: &'static str,
    key: impl Fn(&'a T) -> K,
) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for row in rows {
        let k = key(row);
        if seen.contains(&k) {
            return Err(ValidationError::DuplicateKey {
                field,
                key: k.to_string(),
            });
        }
        seen.insert(k);
    }
    Ok(())
}

/// Checks that every partition column of `T` exists in its schema.
pub fn validate_partition_columns<T: StarTable>() -> ValidationResult<()> {
    let schema = T::schema();
    for &column in T::PARTITION_COLUMNS {
        if schema.index_of(column).is_err() {
            return Err(ValidationError::UnknownPartitionColumn { column });
        }
    }
    Ok(())
}

pub fn validate_songs(rows: &[SongRow]) -> ValidationResult<()> {
    validate_partition_columns::<SongRow>()?;
    validate_unique(rows, "song_id", |r| r.song_id.as_str())
}

pub fn validate_artists(rows: &[ArtistRow]) -> ValidationResult<()> {
    validate_partition_columns::<ArtistRow>()?;
    validate_unique(rows, "artist_id", |r| r.artist_id.as_str())
}

pub fn validate_users(rows: &[UserRow]) -> ValidationResult<()> {
    validate_partition_columns::<UserRow>()?;
    validate_unique(rows, "userId", |r| r.user_id.as_str())
}

pub fn validate_time(rows: &[TimeRow]) -> ValidationResult<()> {
    validate_partition_columns::<TimeRow>()?;
    validate_unique(rows, "start_time", |r| r.start_time)
}

pub fn validate_songplays(rows: &[SongplayRow]) -> ValidationResult<()> {
    validate_partition_columns::<SongplayRow>()?;
    for pair in rows.windows(2) {
        if pair[1].songplay_id <= pair[0].songplay_id {
            return Err(ValidationError::NonIncreasingId {
                field: "songplay_id",
                previous: pair[0].songplay_id,
                current: pair[1].songplay_id,
            });
        }
    }
    for (row, play) in rows.iter().enumerate() {
        if play.song_id.is_none() {
            return Err(ValidationError::MissingJoinKey {
                field: "song_id",
                row,
            });
        }
        if play.artist_id.is_none() {
            return Err(ValidationError::MissingJoinKey {
                field: "artist_id",
                row,
            });
        }
    }
    Ok(())
}
