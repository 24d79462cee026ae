use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::config::{AppConfig, CliConfig, FileConfig};
use sparkify_etl::pipeline::KeepPolicy;
use sparkify_etl::{Compression, RunSummary, Stage, TimeZoneMode, WriteMode};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(about = "Build the Sparkify star schema from song and log JSON")]
struct CliArgs {
    /// Directory holding the song_data and log_data trees.
    #[clap(value_parser = parse_path)]
    pub input_root: Option<PathBuf>,

    /// Directory the Parquet tables are written to.
    #[clap(value_parser = parse_path)]
    pub output_root: Option<PathBuf>,

    /// Path to a TOML config file. Its values override the flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Glob of song metadata files, relative to the input root.
    #[clap(long)]
    pub song_glob: Option<String>,

    /// Glob of event log files, relative to the input root.
    #[clap(long)]
    pub log_glob: Option<String>,

    /// Zone used for the calendar fields of start times.
    #[clap(long, value_enum, default_value_t = TimeZoneMode::Local)]
    pub timezone: TimeZoneMode,

    /// Which event wins when a user appears more than once.
    #[clap(long, value_enum, default_value_t = KeepPolicy::First)]
    pub users_keep: KeepPolicy,

    #[clap(long, value_enum, default_value_t = WriteMode::Overwrite)]
    pub write_mode: WriteMode,

    #[clap(long, value_enum, default_value_t = Compression::Snappy)]
    pub compression: Compression,

    /// Run the song and log stages concurrently.
    #[clap(long)]
    pub parallel: bool,

    #[clap(long, value_enum, default_value_t = Stage::All)]
    pub stage: Stage,

    /// Build and validate every table without writing anything.
    #[clap(long)]
    pub dry_run: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            input_root: self.input_root.clone(),
            output_root: self.output_root.clone(),
            song_glob: self.song_glob.clone(),
            log_glob: self.log_glob.clone(),
            timezone: self.timezone,
            users_keep: self.users_keep,
            write_mode: self.write_mode,
            compression: self.compression,
            parallel: self.parallel,
            stage: self.stage,
            dry_run: self.dry_run,
        }
    }
}

fn log_summary(summary: &RunSummary) {
    info!("");
    info!("ETL Summary");
    info!("===========");
    info!("Song records read: {}", summary.raw_songs);
    info!("Log events read: {}", summary.raw_events);
    info!("  {} songs", summary.songs);
    info!("  {} artists", summary.artists);
    info!("  {} users", summary.users);
    info!("  {} time rows", summary.time);
    info!("  {} songplays", summary.songplays);
    info!(
        "Tables written: {}, skipped: {}",
        summary.tables_written, summary.tables_skipped
    );
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let summary = sparkify_etl::run(&config).context("ETL run failed")?;
    log_summary(&summary);
    if config.dry_run {
        info!("Dry run completed, nothing was written");
    } else {
        info!("ETL completed successfully!");
    }
    Ok(())
}
