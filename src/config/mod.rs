mod file_config;

pub use file_config::{FileConfig, OutputConfig};

use crate::orchestrator::Stage;
use crate::pipeline::{KeepPolicy, LogOptions};
use crate::sink::{Compression, WriteMode, WriteOptions};
use crate::tables::StarTable;
use crate::timestamp::TimeZoneMode;
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_SONG_GLOB: &str = "song_data/*/*/*/*.json";
pub const DEFAULT_LOG_GLOB: &str = "log_data/*/*/*.json";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub input_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub song_glob: Option<String>,
    pub log_glob: Option<String>,
    pub timezone: TimeZoneMode,
    pub users_keep: KeepPolicy,
    pub write_mode: WriteMode,
    pub compression: Compression,
    pub parallel: bool,
    pub stage: Stage,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub song_glob: String,
    pub log_glob: String,

    pub timezone: TimeZoneMode,
    pub users_keep: KeepPolicy,

    pub write: WriteOptions,

    pub parallel: bool,
    pub stage: Stage,
    pub dry_run: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let input_root = file
            .input_root
            .map(PathBuf::from)
            .or_else(|| cli.input_root.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("input_root must be specified as an argument or in config file")
            })?;

        if !input_root.exists() {
            bail!("Input root does not exist: {:?}", input_root);
        }
        if !input_root.is_dir() {
            bail!("input_root is not a directory: {:?}", input_root);
        }

        let output_root = file
            .output_root
            .map(PathBuf::from)
            .or_else(|| cli.output_root.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("output_root must be specified as an argument or in config file")
            })?;

        // Created on first write when missing
        if output_root.exists() && !output_root.is_dir() {
            bail!("output_root is not a directory: {:?}", output_root);
        }

        let song_glob = file
            .song_glob
            .or_else(|| cli.song_glob.clone())
            .unwrap_or_else(|| DEFAULT_SONG_GLOB.to_string());
        let log_glob = file
            .log_glob
            .or_else(|| cli.log_glob.clone())
            .unwrap_or_else(|| DEFAULT_LOG_GLOB.to_string());
        if song_glob.trim().is_empty() {
            bail!("song_glob must not be empty");
        }
        if log_glob.trim().is_empty() {
            bail!("log_glob must not be empty");
        }

        let output_file = file.output.unwrap_or_default();
        let write = WriteOptions {
            mode: output_file.write_mode.unwrap_or(cli.write_mode),
            compression: output_file.compression.unwrap_or(cli.compression),
        };

        Ok(Self {
            input_root,
            output_root,
            song_glob,
            log_glob,
            timezone: file.timezone.unwrap_or(cli.timezone),
            users_keep: file.users_keep.unwrap_or(cli.users_keep),
            write,
            parallel: file.parallel.unwrap_or(cli.parallel),
            stage: file.stage.unwrap_or(cli.stage),
            dry_run: file.dry_run.unwrap_or(cli.dry_run),
        })
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            zone: self.timezone,
            users_keep: self.users_keep,
        }
    }

    /// Directory of table `T` under the output root.
    pub fn table_path<T: StarTable>(&self) -> PathBuf {
        self.output_root.join(T::DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{SongRow, SongplayRow};
    use tempfile::TempDir;

    fn make_temp_input_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = make_temp_input_dir();
        let cli = CliConfig {
            input_root: Some(temp_dir.path().to_path_buf()),
            output_root: Some(PathBuf::from("/out")),
            song_glob: Some("songs/*.json".to_string()),
            log_glob: None,
            timezone: TimeZoneMode::Utc,
            users_keep: KeepPolicy::Last,
            write_mode: WriteMode::Ignore,
            compression: Compression::None,
            parallel: true,
            stage: Stage::Songs,
            dry_run: true,
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.input_root, temp_dir.path());
        assert_eq!(config.output_root, PathBuf::from("/out"));
        assert_eq!(config.song_glob, "songs/*.json");
        assert_eq!(config.log_glob, DEFAULT_LOG_GLOB);
        assert_eq!(config.timezone, TimeZoneMode::Utc);
        assert_eq!(config.users_keep, KeepPolicy::Last);
        assert_eq!(config.write.mode, WriteMode::Ignore);
        assert_eq!(config.write.compression, Compression::None);
        assert!(config.parallel);
        assert_eq!(config.stage, Stage::Songs);
        assert!(config.dry_run);
    }

    #[test]
    fn test_resolve_defaults() {
        let temp_dir = make_temp_input_dir();
        let cli = CliConfig {
            input_root: Some(temp_dir.path().to_path_buf()),
            output_root: Some(temp_dir.path().join("out")),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.song_glob, DEFAULT_SONG_GLOB);
        assert_eq!(config.log_glob, DEFAULT_LOG_GLOB);
        assert_eq!(config.timezone, TimeZoneMode::Local);
        assert_eq!(config.users_keep, KeepPolicy::First);
        assert_eq!(config.write, WriteOptions::default());
        assert_eq!(config.stage, Stage::All);
        assert!(!config.parallel);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = make_temp_input_dir();
        let cli = CliConfig {
            input_root: Some(PathBuf::from("/should/be/overridden")),
            output_root: Some(PathBuf::from("/cli/out")),
            log_glob: Some("cli/*.json".to_string()),
            timezone: TimeZoneMode::Local,
            compression: Compression::Zstd,
            ..Default::default()
        };

        let file_config = FileConfig {
            input_root: Some(temp_dir.path().to_string_lossy().to_string()),
            output_root: Some("/toml/out".to_string()),
            timezone: Some(TimeZoneMode::Utc),
            output: Some(OutputConfig {
                write_mode: Some(WriteMode::ErrorIfExists),
                compression: None,
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.input_root, temp_dir.path());
        assert_eq!(config.output_root, PathBuf::from("/toml/out"));
        assert_eq!(config.timezone, TimeZoneMode::Utc);
        assert_eq!(config.write.mode, WriteMode::ErrorIfExists);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.log_glob, "cli/*.json");
        assert_eq!(config.write.compression, Compression::Zstd);
    }

    #[test]
    fn test_resolve_missing_input_root_error() {
        let cli = CliConfig::default();
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("input_root must be specified"));
    }

    #[test]
    fn test_resolve_missing_output_root_error() {
        let temp_dir = make_temp_input_dir();
        let cli = CliConfig {
            input_root: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("output_root must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_input_root_error() {
        let cli = CliConfig {
            input_root: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            output_root: Some(PathBuf::from("/out")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_input_root_not_directory_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            input_root: Some(temp_file.path().to_path_buf()),
            output_root: Some(PathBuf::from("/out")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_resolve_output_root_is_file_error() {
        let temp_dir = make_temp_input_dir();
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            input_root: Some(temp_dir.path().to_path_buf()),
            output_root: Some(temp_file.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("output_root is not a directory"));
    }

    #[test]
    fn test_resolve_empty_glob_error() {
        let temp_dir = make_temp_input_dir();
        let cli = CliConfig {
            input_root: Some(temp_dir.path().to_path_buf()),
            output_root: Some(temp_dir.path().join("out")),
            song_glob: Some("  ".to_string()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("song_glob"));
    }

    #[test]
    fn test_table_path_helpers() {
        let temp_dir = make_temp_input_dir();
        let out = temp_dir.path().join("out");
        let cli = CliConfig {
            input_root: Some(temp_dir.path().to_path_buf()),
            output_root: Some(out.clone()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.table_path::<SongRow>(), out.join("songs.parquet"));
        assert_eq!(
            config.table_path::<SongplayRow>(),
            out.join("songplays.parquet")
        );
    }
}
