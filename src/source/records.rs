use serde::Deserialize;
use serde_json::Value;

/// One song-metadata record as found in the song dataset.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawSong {
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
    pub artist_location: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    pub year: Option<i32>,
    pub duration: Option<f64>,
}

/// One logged user event.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Epoch milliseconds, kept raw until timestamp derivation.
    #[serde(default)]
    pub ts: Value,
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
    pub page: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub artist: Option<String>,
    pub song: Option<String>,
    #[serde(alias = "length")]
    pub duration: Option<f64>,
}

pub const NEXT_SONG_PAGE: &str = "NextSong";

impl RawEvent {
    /// Only `NextSong` events represent plays.
    pub fn is_song_play(&self) -> bool {
        self.page.as_deref() == Some(NEXT_SONG_PAGE)
    }
}
