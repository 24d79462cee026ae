//! Test fixture creation for input datasets

use super::constants::*;
use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn song_record(
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    year: i32,
    duration: f64,
) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": year
    })
}

/// A logged event. Plays carry artist and song, page views carry nulls.
pub fn event(ts: i64, user_id: &str, level: &str, page: &str, artist: Option<&str>) -> Value {
    let (first_name, last_name, gender) = match user_id {
        USER_KAYLEE_ID => ("Kaylee", "Summers", "F"),
        USER_RYAN_ID => ("Ryan", "Smith", "M"),
        _ => ("Test", "User", "F"),
    };
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": first_name,
        "gender": gender,
        "itemInSession": 0,
        "lastName": last_name,
        "length": artist.map(|_| 239.3073),
        "level": level,
        "location": "Phoenix-Mesa-Scottsdale, AZ",
        "method": "PUT",
        "page": page,
        "registration": 1540344794796i64,
        "sessionId": 139,
        "song": artist.map(|_| "Some Song"),
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0",
        "userId": user_id
    })
}

/// Writes one JSON object per line.
pub fn write_json_lines(path: &Path, records: &[Value]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let lines: Vec<String> = records.iter().map(Value::to_string).collect();
    fs::write(path, lines.join("\n"))?;
    Ok(())
}

/// Creates an input root holding 3 songs by 2 artists and 7 events over 2
/// log files.
/// Returns (temp_dir, input_root, output_root)
pub fn create_sample_dataset() -> Result<(TempDir, PathBuf, PathBuf)> {
    let dir = TempDir::new()?;
    let input_root = dir.path().join("input");
    let output_root = dir.path().join("output");

    let songs = input_root.join("song_data");
    write_json_lines(
        &songs.join("A/A/A/TRAAAAW128F429D538.json"),
        &[song_record(
            SONG_1_ID,
            "I Didn't Mean To",
            CASUAL_ARTIST_ID,
            CASUAL_ARTIST_NAME,
            0,
            218.93179,
        )],
    )?;
    write_json_lines(
        &songs.join("A/A/B/TRAABCL128F4286650.json"),
        &[song_record(
            SONG_2_ID,
            "Setanta matins",
            ELENA_ARTIST_ID,
            ELENA_ARTIST_NAME,
            2000,
            269.58322,
        )],
    )?;
    write_json_lines(
        &songs.join("A/B/A/TRABACN128F425B784.json"),
        &[song_record(
            SONG_3_ID,
            "Lo Que Quieras",
            CASUAL_ARTIST_ID,
            CASUAL_ARTIST_NAME,
            2004,
            195.2,
        )],
    )?;

    let logs = input_root.join("log_data/2018/11");
    write_json_lines(
        &logs.join("2018-11-01-events.json"),
        &[
            event(BASE_TS, USER_KAYLEE_ID, "free", "Home", None),
            event(BASE_TS + 1_000, USER_KAYLEE_ID, "free", "NextSong", Some(ELENA_ARTIST_NAME)),
            event(BASE_TS + 2_000, USER_RYAN_ID, "free", "NextSong", Some("Unknown Band")),
            event(BASE_TS + 3_000, USER_RYAN_ID, "free", "NextSong", Some(CASUAL_ARTIST_NAME)),
            event(BASE_TS + 4_000, USER_RYAN_ID, "free", "Logout", None),
        ],
    )?;
    write_json_lines(
        &logs.join("2018-11-02-events.json"),
        &[
            event(BASE_TS + 86_400_000, USER_KAYLEE_ID, "paid", "Upgrade", None),
            event(
                BASE_TS + 86_401_000,
                USER_KAYLEE_ID,
                "paid",
                "NextSong",
                Some(CASUAL_ARTIST_NAME),
            ),
        ],
    )?;

    Ok((dir, input_root, output_root))
}
