//! Configuration system for earthgen.
//!
//! Generator, cache and host settings persist to disk as a RON file. CLI
//! flags (clap) override whatever was loaded, and unknown or missing fields
//! fall back to defaults so older files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CacheConfig, Config, DebugConfig, ElevationConfig, GeneratorConfig, HostConfig,
    ProjectionConfig, StructureConfig, default_config_dir,
};
pub use error::ConfigError;
