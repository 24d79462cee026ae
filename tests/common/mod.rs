//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{test_config, create_sample_dataset};
//!
//! #[test]
//! fn test_run() {
//!     let (_dir, input, output) = create_sample_dataset().unwrap();
//!     let summary = sparkify_etl::run(&test_config(&input, &output)).unwrap();
//!     assert_eq!(summary.songs, 3);
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{create_sample_dataset, event, song_record, write_json_lines};

use sparkify_etl::config::{AppConfig, CliConfig};
use sparkify_etl::TimeZoneMode;
use std::path::Path;

/// Default run config over the given roots, with UTC calendar fields.
pub fn test_config(input_root: &Path, output_root: &Path) -> AppConfig {
    let cli = CliConfig {
        input_root: Some(input_root.to_path_buf()),
        output_root: Some(output_root.to_path_buf()),
        timezone: TimeZoneMode::Utc,
        ..Default::default()
    };
    AppConfig::resolve(&cli, None).unwrap()
}
