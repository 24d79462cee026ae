mod dedup;
pub mod logs;
pub mod songs;

pub use dedup::{dedup_by_key, KeepPolicy};
pub use logs::{LogOptions, LogTables};
pub use songs::SongTables;
