//! Declared schemas for the two raw sources.

use serde_json::Value;
use std::fmt;

/// Semantic type of a raw JSON field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Float,
    /// Epoch milliseconds. Checked during timestamp derivation, not at read time.
    EpochMillis,
}

impl FieldType {
    /// Whether a present, non-null JSON value conforms to this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::EpochMillis => true,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Float => write!(f, "float"),
            FieldType::EpochMillis => write!(f, "epoch milliseconds"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Other keys the same field may appear under.
    pub aliases: &'static [&'static str],
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldSpec {
    const fn required(name: &'static str, field_type: FieldType) -> Self {
        FieldSpec {
            name,
            aliases: &[],
            field_type,
            required: true,
        }
    }

    const fn optional(name: &'static str, field_type: FieldType) -> Self {
        FieldSpec {
            name,
            aliases: &[],
            field_type,
            required: false,
        }
    }

    const fn with_aliases(self, aliases: &'static [&'static str]) -> Self {
        FieldSpec { aliases, ..self }
    }

    /// Looks the field up in a raw record under its name or any alias.
    pub fn lookup<'a>(&self, record: &'a serde_json::Map<String, Value>) -> Option<&'a Value> {
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .find_map(|key| record.get(*key))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SourceSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

pub const SONG_SCHEMA: SourceSchema = SourceSchema {
    name: "song_data",
    fields: &[
        FieldSpec::optional("num_songs", FieldType::Integer),
        FieldSpec::required("song_id", FieldType::Text),
        FieldSpec::required("title", FieldType::Text),
        FieldSpec::required("artist_id", FieldType::Text),
        FieldSpec::required("artist_name", FieldType::Text),
        FieldSpec::required("artist_location", FieldType::Text),
        FieldSpec::required("artist_latitude", FieldType::Float),
        FieldSpec::required("artist_longitude", FieldType::Float),
        FieldSpec::required("year", FieldType::Integer),
        FieldSpec::required("duration", FieldType::Float),
    ],
};

pub const EVENT_SCHEMA: SourceSchema = SourceSchema {
    name: "log_data",
    fields: &[
        FieldSpec::required("ts", FieldType::EpochMillis),
        FieldSpec::required("userId", FieldType::Text),
        FieldSpec::required("firstName", FieldType::Text),
        FieldSpec::required("lastName", FieldType::Text),
        FieldSpec::required("gender", FieldType::Text),
        FieldSpec::required("level", FieldType::Text),
        FieldSpec::required("page", FieldType::Text),
        FieldSpec::required("sessionId", FieldType::Integer),
        FieldSpec::required("location", FieldType::Text),
        FieldSpec::required("userAgent", FieldType::Text),
        FieldSpec::required("artist", FieldType::Text),
        FieldSpec::optional("song", FieldType::Text),
        FieldSpec::optional("length", FieldType::Float).with_aliases(&["duration"]),
    ],
};
