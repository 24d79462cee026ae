//! Log pipeline: users and time dimensions plus the songplays fact table.

use super::dedup::{dedup_by_key, KeepPolicy};
use crate::error::DerivationError;
use crate::source::{RawEvent, RawSong};
use crate::tables::{SongplayRow, TimeRow, UserRow};
use crate::timestamp::{parse_epoch_millis, start_time, to_datetime, TimeParts, TimeZoneMode};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub zone: TimeZoneMode,
    pub users_keep: KeepPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogTables {
    pub users: Vec<UserRow>,
    pub time: Vec<TimeRow>,
    pub songplays: Vec<SongplayRow>,
}

/// Users who played at least one song, one row per `userId`.
pub fn extract_users(events: &[RawEvent], keep: KeepPolicy) -> Vec<UserRow> {
    let rows = events
        .iter()
        .filter(|e| e.is_song_play())
        .filter_map(|e| {
            Some(UserRow {
                user_id: e.user_id.clone()?,
                first_name: e.first_name.clone(),
                last_name: e.last_name.clone(),
                gender: e.gender.clone(),
                level: e.level.clone(),
            })
        });
    dedup_by_key(rows, keep, |u| u.user_id.clone())
}

/// One row per distinct start time over all events, plays or not.
///
/// Events without a `ts` have no start time and are skipped.
pub fn extract_time(
    events: &[RawEvent],
    zone: TimeZoneMode,
) -> Result<Vec<TimeRow>, DerivationError> {
    let start_times = events
        .par_iter()
        .map(|e| match parse_epoch_millis(&e.ts)? {
            Some(ts) => to_datetime(ts, zone).map(Some),
            None => Ok(None),
        })
        .collect::<Result<Vec<Option<NaiveDateTime>>, DerivationError>>()?;

    Ok(dedup_by_key(start_times.into_iter().flatten(), KeepPolicy::First, |t| *t)
        .into_iter()
        .map(TimeRow::from)
        .collect())
}

/// Song metadata keyed by artist name; the first song of each name wins.
///
/// Songs without a `song_id` or `artist_id` never reach the songs table, so
/// they take no part in the join.
pub fn songs_by_artist_name(songs: &[RawSong]) -> HashMap<&str, &RawSong> {
    let mut view = HashMap::new();
    for song in songs
        .iter()
        .filter(|s| s.song_id.is_some() && s.artist_id.is_some())
    {
        if let Some(name) = song.artist_name.as_deref() {
            view.entry(name).or_insert(song);
        }
    }
    view
}

/// Joins plays to song metadata on `event.artist == song.artist_name`.
///
/// The join is inner: plays whose artist matches no song are dropped. Ids are
/// assigned in event source order, starting at 0.
pub fn extract_songplays(
    events: &[RawEvent],
    songs: &[RawSong],
    zone: TimeZoneMode,
) -> Result<Vec<SongplayRow>, DerivationError> {
    let view = songs_by_artist_name(songs);
    let mut songplays = Vec::new();
    for event in events.iter().filter(|e| e.is_song_play()) {
        let Some(song) = event.artist.as_deref().and_then(|a| view.get(a)) else {
            continue;
        };
        let Some(ts) = parse_epoch_millis(&event.ts)? else {
            continue;
        };
        let start = start_time(ts, zone)?;
        let parts = TimeParts::from(start);
        songplays.push(SongplayRow {
            songplay_id: songplays.len() as i64,
            start_time: start,
            month: parts.month,
            year: parts.year,
            user_id: event.user_id.clone(),
            level: event.level.clone(),
            song_id: song.song_id.clone(),
            artist_id: song.artist_id.clone(),
            session_id: event.session_id,
            location: event.location.clone(),
            user_agent: event.user_agent.clone(),
        });
    }
    Ok(songplays)
}

pub fn run(
    events: &[RawEvent],
    songs: &[RawSong],
    options: LogOptions,
) -> Result<LogTables, DerivationError> {
    let users = extract_users(events, options.users_keep);
    let time = extract_time(events, options.zone)?;
    let songplays = extract_songplays(events, songs, options.zone)?;
    let anonymous_plays = events
        .iter()
        .filter(|e| e.is_song_play() && e.user_id.is_none())
        .count();
    if anonymous_plays > 0 {
        warn!("Dropped {} plays without userId from users", anonymous_plays);
    }
    info!(
        "Log pipeline: {} events -> {} users, {} time rows, {} songplays",
        events.len(),
        users.len(),
        time.len(),
        songplays.len()
    );
    Ok(LogTables {
        users,
        time,
        songplays,
    })
}
