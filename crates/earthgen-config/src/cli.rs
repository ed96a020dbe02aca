//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// earthgen command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "earthgen", about = "Geographic voxel terrain generator")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Loader worker threads (0 = auto).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Idle seconds before a cached column is evicted.
    #[arg(long)]
    pub idle_timeout: Option<u64>,

    /// Whether the host announces chunks before loading them.
    #[arg(long)]
    pub async_prefetch: Option<bool>,

    /// Disable cave carving.
    #[arg(long)]
    pub no_caves: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Chunk X at the centre of the generated region.
    #[arg(long, default_value_t = 500, allow_negative_numbers = true)]
    pub center_x: i32,

    /// Chunk Z at the centre of the generated region.
    #[arg(long, default_value_t = -300, allow_negative_numbers = true)]
    pub center_z: i32,

    /// Radius of the generated region, in chunks.
    #[arg(long, default_value_t = 4)]
    pub radius: i32,

    /// Lowest cube Y to generate.
    #[arg(long, default_value_t = -2, allow_negative_numbers = true)]
    pub min_cube_y: i32,

    /// Highest cube Y to generate.
    #[arg(long, default_value_t = 4, allow_negative_numbers = true)]
    pub max_cube_y: i32,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.generator.seed = seed;
        }
        if let Some(workers) = args.workers {
            self.cache.worker_threads = workers;
        }
        if let Some(idle) = args.idle_timeout {
            self.cache.idle_timeout_secs = idle;
        }
        if let Some(async_prefetch) = args.async_prefetch {
            self.host.async_prefetch = async_prefetch;
        }
        if args.no_caves {
            self.generator.structures.caves = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> CliArgs {
        CliArgs::parse_from(["earthgen"])
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(7),
            workers: Some(2),
            no_caves: true,
            ..no_overrides()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.generator.seed, 7);
        assert_eq!(config.cache.worker_threads, 2);
        assert!(!config.generator.structures.caves);
        // Non-overridden fields retain defaults
        assert_eq!(config.cache.idle_timeout_secs, 300);
        assert!(config.host.async_prefetch);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&no_overrides());
        assert_eq!(config, original);
    }

    #[test]
    fn test_negative_center_parses() {
        let args = CliArgs::parse_from(["earthgen", "--center-x", "-12", "--center-z", "40"]);
        assert_eq!(args.center_x, -12);
        assert_eq!(args.center_z, 40);
        assert_eq!(args.radius, 4);
    }
}
