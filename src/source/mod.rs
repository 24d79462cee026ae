//! Record source: reads raw JSON records matching a glob under the input root.

mod records;
mod schema;

pub use records::{RawEvent, RawSong, NEXT_SONG_PAGE};
pub use schema::{FieldSpec, FieldType, SourceSchema, EVENT_SCHEMA, SONG_SCHEMA};

use crate::error::{EtlError, EtlResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolves `pattern` relative to `root` and returns the matching files in
/// lexicographic order.
pub fn resolve_glob(root: &Path, pattern: &str) -> EtlResult<Vec<PathBuf>> {
    let full_pattern = root.join(pattern);
    let pattern_str = full_pattern.to_string_lossy().to_string();
    let entries =
        glob::glob(&pattern_str).map_err(|e| EtlError::source_read(&full_pattern, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| EtlError::source_read(e.path().to_path_buf(), e.error()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(EtlError::source_read(full_pattern, "no files match the pattern"));
    }
    files.sort();
    Ok(files)
}

/// Parses every JSON object in a file. Objects may be newline-delimited or
/// simply concatenated.
fn parse_objects(path: &Path) -> EtlResult<Vec<Map<String, Value>>> {
    let text = std::fs::read_to_string(path).map_err(|e| EtlError::source_read(path, e))?;
    let mut objects = Vec::new();
    for item in serde_json::Deserializer::from_str(&text).into_iter::<Value>() {
        match item {
            Ok(Value::Object(map)) => objects.push(map),
            Ok(other) => {
                return Err(EtlError::source_read(
                    path,
                    format!("expected a JSON object, found {}", json_kind(&other)),
                ))
            }
            Err(e) => {
                return Err(EtlError::source_read(
                    path,
                    format!("invalid JSON at line {} column {}: {}", e.line(), e.column(), e),
                ))
            }
        }
    }
    Ok(objects)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Checks one record against the declared schema, noting which fields it carries.
fn check_record(
    schema: &SourceSchema,
    path: &Path,
    record: &Map<String, Value>,
    seen: &mut HashSet<&'static str>,
) -> EtlResult<()> {
    for field in schema.fields {
        let Some(value) = field.lookup(record) else {
            continue;
        };
        seen.insert(field.name);
        if !value.is_null() && !field.field_type.accepts(value) {
            return Err(EtlError::schema(
                schema.name,
                format!(
                    "field '{}' in {} should be {}, found {}",
                    field.name,
                    path.display(),
                    field.field_type,
                    json_kind(value)
                ),
            ));
        }
    }
    Ok(())
}

/// Reads all records of a source in source order, validated against `schema`.
pub fn read_records<T: DeserializeOwned>(
    root: &Path,
    pattern: &str,
    schema: &SourceSchema,
) -> EtlResult<Vec<T>> {
    let files = resolve_glob(root, pattern)?;
    info!(
        "Reading {} from {} files matching {}",
        schema.name,
        files.len(),
        pattern
    );

    let mut seen = HashSet::new();
    let mut raw = Vec::new();
    for path in &files {
        let objects = parse_objects(path)?;
        debug!("{}: {} records", path.display(), objects.len());
        for object in objects {
            check_record(schema, path, &object, &mut seen)?;
            raw.push(object);
        }
    }

    let missing: Vec<&str> = schema
        .fields
        .iter()
        .filter(|f| f.required && !seen.contains(f.name))
        .map(|f| f.name)
        .collect();
    if !raw.is_empty() && !missing.is_empty() {
        return Err(EtlError::schema(
            schema.name,
            format!("required fields absent from every record: {}", missing.join(", ")),
        ));
    }

    let records = raw
        .into_iter()
        .map(|object| {
            serde_json::from_value(Value::Object(object))
                .map_err(|e| EtlError::schema(schema.name, e))
        })
        .collect::<EtlResult<Vec<T>>>()?;
    info!("Read {} {} records", records.len(), schema.name);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    const SONG_A: &str = r#"{"song_id": "S1", "title": "One", "artist_id": "A1", "artist_name": "Ann", "artist_location": "", "artist_latitude": null, "artist_longitude": null, "year": 2000, "duration": 200.0}"#;
    const SONG_B: &str = r#"{"song_id": "S2", "title": "Two", "artist_id": "A2", "artist_name": "Bob", "artist_location": "Rome", "artist_latitude": 41.9, "artist_longitude": 12.5, "year": 0, "duration": 120}"#;

    #[test]
    fn reads_files_in_path_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "song_data/B/b.json", SONG_B);
        write(dir.path(), "song_data/A/a.json", SONG_A);

        let songs: Vec<RawSong> =
            read_records(dir.path(), "song_data/*/*.json", &SONG_SCHEMA).unwrap();
        let ids: Vec<_> = songs.iter().map(|s| s.song_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["S1", "S2"]);
        assert_eq!(songs[1].duration, Some(120.0));
    }

    #[test]
    fn reads_several_objects_per_file() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "song_data/all.json",
            &format!("{}\n\n{}{}", SONG_A, SONG_B, SONG_A),
        );
        let songs: Vec<RawSong> =
            read_records(dir.path(), "song_data/*.json", &SONG_SCHEMA).unwrap();
        assert_eq!(songs.len(), 3);
    }

    #[test]
    fn no_matching_files_is_a_source_error() {
        let dir = TempDir::new().unwrap();
        let result: EtlResult<Vec<RawSong>> =
            read_records(dir.path(), "song_data/*.json", &SONG_SCHEMA);
        match result {
            Err(EtlError::SourceRead { reason, .. }) => assert!(reason.contains("no files")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn invalid_json_names_the_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "song_data/bad.json", "{\"song_id\": ");
        let result: EtlResult<Vec<RawSong>> =
            read_records(dir.path(), "song_data/*.json", &SONG_SCHEMA);
        match result {
            Err(EtlError::SourceRead { path, .. }) => assert!(path.ends_with("bad.json")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn non_object_record_is_a_source_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "song_data/list.json", "[1, 2, 3]");
        let result: EtlResult<Vec<RawSong>> =
            read_records(dir.path(), "song_data/*.json", &SONG_SCHEMA);
        assert!(matches!(result, Err(EtlError::SourceRead { .. })));
    }

    #[test]
    fn required_field_missing_everywhere_is_a_schema_error() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "song_data/a.json",
            r#"{"song_id": "S1", "title": "One", "artist_id": "A1", "artist_name": "Ann", "artist_location": "", "artist_latitude": null, "artist_longitude": null, "duration": 1.0}"#,
        );
        let result: EtlResult<Vec<RawSong>> =
            read_records(dir.path(), "song_data/*.json", &SONG_SCHEMA);
        match result {
            Err(EtlError::Schema { reason, .. }) => assert!(reason.contains("year")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn field_missing_in_some_records_is_null() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "song_data/a.json",
            &format!(
                "{}\n{}",
                SONG_A,
                r#"{"song_id": "S3", "artist_id": "A3", "artist_name": "Cy"}"#
            ),
        );
        let songs: Vec<RawSong> =
            read_records(dir.path(), "song_data/*.json", &SONG_SCHEMA).unwrap();
        assert_eq!(songs[1].title, None);
        assert_eq!(songs[1].year, None);
    }

    #[test]
    fn mistyped_value_is_a_schema_error() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "song_data/a.json",
            &SONG_A.replace("\"year\": 2000", "\"year\": \"2000\""),
        );
        let result: EtlResult<Vec<RawSong>> =
            read_records(dir.path(), "song_data/*.json", &SONG_SCHEMA);
        match result {
            Err(EtlError::Schema { reason, .. }) => {
                assert!(reason.contains("'year'"));
                assert!(reason.contains("integer"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn events_keep_raw_ts_for_derivation() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "log_data/2018/11/events.json",
            r#"{"ts": "not-a-number", "userId": "1", "firstName": "A", "lastName": "B", "gender": "F", "level": "free", "page": "Home", "sessionId": 1, "location": "X", "userAgent": "UA", "artist": null}"#,
        );
        let events: Vec<RawEvent> =
            read_records(dir.path(), "log_data/*/*/*.json", &EVENT_SCHEMA).unwrap();
        assert_eq!(events[0].ts, serde_json::json!("not-a-number"));
    }
}
