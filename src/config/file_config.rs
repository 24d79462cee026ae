use crate::orchestrator::Stage;
use crate::pipeline::KeepPolicy;
use crate::sink::{Compression, WriteMode};
use crate::timestamp::TimeZoneMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Locations (can override CLI)
    pub input_root: Option<String>,
    pub output_root: Option<String>,
    pub song_glob: Option<String>,
    pub log_glob: Option<String>,

    // Transformation
    pub timezone: Option<TimeZoneMode>,
    pub users_keep: Option<KeepPolicy>,

    // Run control
    pub parallel: Option<bool>,
    pub stage: Option<Stage>,
    pub dry_run: Option<bool>,

    pub output: Option<OutputConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub write_mode: Option<WriteMode>,
    pub compression: Option<Compression>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
