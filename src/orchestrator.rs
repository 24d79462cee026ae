//! Runs the song and log stages against the configured roots.

use crate::config::AppConfig;
use crate::error::{EtlError, EtlResult};
use crate::pipeline::{logs, songs};
use crate::sink::{write_table, WriteOutcome};
use crate::source::{read_records, RawEvent, RawSong, EVENT_SCHEMA, SONG_SCHEMA};
use crate::tables::StarTable;
use crate::validation::{self, ValidationResult};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use clap::ValueEnum;
use serde::Deserialize;
use tracing::{debug, info, Level};

const PREVIEW_ROWS: usize = 5;

/// Which stages a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    All,
    /// Songs and artists only.
    Songs,
    /// Users, time and songplays only.
    Logs,
}

impl Stage {
    fn runs_songs(self) -> bool {
        matches!(self, Stage::All | Stage::Songs)
    }

    fn runs_logs(self) -> bool {
        matches!(self, Stage::All | Stage::Logs)
    }
}

/// Row counts of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub raw_songs: usize,
    pub raw_events: usize,
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time: usize,
    pub songplays: usize,
    pub tables_written: usize,
    pub tables_skipped: usize,
}

impl RunSummary {
    fn merge(mut self, other: RunSummary) -> Self {
        // Both stages read the same song source.
        self.raw_songs = self.raw_songs.max(other.raw_songs);
        self.raw_events += other.raw_events;
        self.songs += other.songs;
        self.artists += other.artists;
        self.users += other.users;
        self.time += other.time;
        self.songplays += other.songplays;
        self.tables_written += other.tables_written;
        self.tables_skipped += other.tables_skipped;
        self
    }

    fn record(&mut self, outcome: Option<WriteOutcome>) {
        match outcome {
            Some(WriteOutcome::Written { .. }) => self.tables_written += 1,
            Some(WriteOutcome::Skipped) => self.tables_skipped += 1,
            None => {}
        }
    }
}

/// Runs the configured stages. The first error aborts the run.
pub fn run(config: &AppConfig) -> EtlResult<RunSummary> {
    info!(
        "Starting ETL run: {:?} -> {:?} (stage: {:?})",
        config.input_root, config.output_root, config.stage
    );

    let song_stage = || -> EtlResult<RunSummary> {
        if config.stage.runs_songs() {
            run_song_stage(config)
        } else {
            Ok(RunSummary::default())
        }
    };
    let log_stage = || -> EtlResult<RunSummary> {
        if config.stage.runs_logs() {
            run_log_stage(config)
        } else {
            Ok(RunSummary::default())
        }
    };

    let (song_summary, log_summary) = if config.parallel {
        let (songs, logs) = rayon::join(song_stage, log_stage);
        (songs?, logs?)
    } else {
        let songs = song_stage()?;
        (songs, log_stage()?)
    };

    Ok(song_summary.merge(log_summary))
}

fn read_songs(config: &AppConfig) -> EtlResult<Vec<RawSong>> {
    read_records(&config.input_root, &config.song_glob, &SONG_SCHEMA)
}

fn run_song_stage(config: &AppConfig) -> EtlResult<RunSummary> {
    let records = read_songs(config)?;
    let tables = songs::run(&records);

    let mut summary = RunSummary {
        raw_songs: records.len(),
        songs: tables.songs.len(),
        artists: tables.artists.len(),
        ..Default::default()
    };
    summary.record(emit(config, &tables.songs, validation::validate_songs)?);
    summary.record(emit(config, &tables.artists, validation::validate_artists)?);
    Ok(summary)
}

fn run_log_stage(config: &AppConfig) -> EtlResult<RunSummary> {
    let events: Vec<RawEvent> =
        read_records(&config.input_root, &config.log_glob, &EVENT_SCHEMA)?;
    // The join works from its own read of the song source.
    let song_view = read_songs(config)?;

    let tables = logs::run(&events, &song_view, config.log_options())?;

    let mut summary = RunSummary {
        raw_songs: song_view.len(),
        raw_events: events.len(),
        users: tables.users.len(),
        time: tables.time.len(),
        songplays: tables.songplays.len(),
        ..Default::default()
    };
    summary.record(emit(config, &tables.users, validation::validate_users)?);
    summary.record(emit(config, &tables.time, validation::validate_time)?);
    summary.record(emit(config, &tables.songplays, validation::validate_songplays)?);
    Ok(summary)
}

/// Validates, converts and writes one table. Returns `None` on a dry run.
fn emit<T: StarTable>(
    config: &AppConfig,
    rows: &[T],
    validate: fn(&[T]) -> ValidationResult<()>,
) -> EtlResult<Option<WriteOutcome>> {
    if !cfg!(feature = "no_checks") {
        validate(rows).map_err(|error| EtlError::Validation {
            table: T::NAME,
            error,
        })?;
    }

    let batch = T::to_record_batch(rows)?;
    info!("Table {}: {} rows", T::NAME, batch.num_rows());
    log_preview::<T>(&batch);

    if config.dry_run {
        info!("Dry run, not writing table {}", T::NAME);
        return Ok(None);
    }

    let target = config.table_path::<T>();
    let outcome = write_table(&batch, &target, T::PARTITION_COLUMNS, config.write)?;
    if let WriteOutcome::Written { files, rows } = outcome {
        info!("Wrote table {} ({} rows, {} files) to {:?}", T::NAME, rows, files, target);
    }
    Ok(Some(outcome))
}

fn log_preview<T: StarTable>(batch: &RecordBatch) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    debug!("Table {} schema: {:?}", T::NAME, batch.schema());
    let head = batch.slice(0, batch.num_rows().min(PREVIEW_ROWS));
    match pretty_format_batches(&[head]) {
        Ok(table) => debug!("Table {} preview:\n{}", T::NAME, table),
        Err(e) => debug!("Table {} preview unavailable: {}", T::NAME, e),
    }
}
