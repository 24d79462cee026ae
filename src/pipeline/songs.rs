//! Song pipeline: songs and artists dimensions from song metadata.

use super::dedup::{dedup_by_key, KeepPolicy};
use crate::source::RawSong;
use crate::tables::{ArtistRow, SongRow};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SongTables {
    pub songs: Vec<SongRow>,
    pub artists: Vec<ArtistRow>,
}

pub fn extract_songs(records: &[RawSong]) -> Vec<SongRow> {
    let rows = records.iter().filter_map(|r| {
        Some(SongRow {
            song_id: r.song_id.clone()?,
            title: r.title.clone(),
            artist_id: r.artist_id.clone(),
            year: r.year,
            duration: r.duration,
        })
    });
    dedup_by_key(rows, KeepPolicy::First, |s| s.song_id.clone())
}

pub fn extract_artists(records: &[RawSong]) -> Vec<ArtistRow> {
    let rows = records.iter().filter_map(|r| {
        Some(ArtistRow {
            artist_id: r.artist_id.clone()?,
            artist_name: r.artist_name.clone(),
            artist_location: r.artist_location.clone(),
            artist_latitude: r.artist_latitude,
            artist_longitude: r.artist_longitude,
        })
    });
    dedup_by_key(rows, KeepPolicy::First, |a| a.artist_id.clone())
}

pub fn run(records: &[RawSong]) -> SongTables {
    let songs = extract_songs(records);
    let artists = extract_artists(records);
    let null_song_ids = records.iter().filter(|r| r.song_id.is_none()).count();
    let null_artist_ids = records.iter().filter(|r| r.artist_id.is_none()).count();
    if null_song_ids + null_artist_ids > 0 {
        warn!(
            "Dropped {} records without song_id and {} without artist_id",
            null_song_ids, null_artist_ids
        );
    }
    info!(
        "Song pipeline: {} records -> {} songs, {} artists",
        records.len(),
        songs.len(),
        artists.len()
    );
    SongTables { songs, artists }
}
