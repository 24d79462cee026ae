//! Shared constants for end-to-end tests
//!
//! When the sample dataset changes, update only this file and
//! `fixtures.rs`.

// ============================================================================
// Sample song metadata
// ============================================================================

/// Artist ID for "Casual", owner of two songs
pub const CASUAL_ARTIST_ID: &str = "ARD7TVE1187B99BFB1";
pub const CASUAL_ARTIST_NAME: &str = "Casual";

/// Artist ID for "Elena"
pub const ELENA_ARTIST_ID: &str = "ARKRRTF1187B9984DA";
pub const ELENA_ARTIST_NAME: &str = "Elena";

/// "I Didn't Mean To" by Casual, year 0 in the source data
pub const SONG_1_ID: &str = "SOMZWCG12A8C13C480";

/// "Setanta matins" by Elena
pub const SONG_2_ID: &str = "SOBONKR12A58A7A7E0";

/// "Lo Que Quieras" by Casual
pub const SONG_3_ID: &str = "SOXVLOJ12AB0189215";

pub const SONG_COUNT: usize = 3;
pub const ARTIST_COUNT: usize = 2;

// ============================================================================
// Sample event logs
// ============================================================================

/// 2018-11-01 20:57:10.796 UTC
pub const BASE_TS: i64 = 1541105830796;

/// Kaylee, plays on free then paid level
pub const USER_KAYLEE_ID: &str = "8";

/// Ryan, plays on free level
pub const USER_RYAN_ID: &str = "26";

pub const EVENT_COUNT: usize = 7;
pub const USER_COUNT: usize = 2;

/// Every event has its own second, plays or not.
pub const TIME_COUNT: usize = 7;

/// NextSong events whose artist matches a song's artist_name
pub const SONGPLAY_COUNT: usize = 3;
