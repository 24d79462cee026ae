//! Sparkify ETL Library
//!
//! Turns raw song metadata and user activity logs into a star schema of
//! partitioned Parquet tables.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod tables;
pub mod timestamp;
pub mod validation;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig};
pub use error::{DerivationError, EtlError, EtlResult};
pub use orchestrator::{run, RunSummary, Stage};
pub use sink::{read_table, write_table, Compression, WriteMode, WriteOptions};
pub use timestamp::TimeZoneMode;
