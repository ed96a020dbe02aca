//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World generator settings (projection, datasets, structures).
    pub generator: GeneratorConfig,
    /// Column data cache settings.
    pub cache: CacheConfig,
    /// Capabilities of the hosting chunk-loading system.
    pub host: HostConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Settings fixed at world-generator construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// World seed. Mixed into per-cube random sources.
    pub seed: u64,
    /// Map projection used to place the globe onto the block grid.
    pub projection: ProjectionConfig,
    /// Elevation source sampled once per block column.
    pub elevation: ElevationConfig,
    /// Optional RON file of tagged point features (shops, parks, ...).
    pub features_file: Option<PathBuf>,
    /// Structure and decoration toggles.
    pub structures: StructureConfig,
}

/// Map projection choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ProjectionConfig {
    /// Plate carrée: longitude and latitude map linearly onto x and -z.
    Equirectangular {
        /// Blocks per degree of arc. 111 320 is roughly one block per metre at the equator.
        blocks_per_degree: f64,
    },
    /// Sinusoidal equal-area projection.
    Sinusoidal {
        /// Blocks per degree of arc along the central meridian.
        blocks_per_degree: f64,
    },
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::Equirectangular {
            blocks_per_degree: 111_320.0,
        }
    }
}

/// Elevation source choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ElevationConfig {
    /// Constant elevation everywhere, in metres.
    Flat {
        /// Elevation in metres above sea level.
        height: f64,
    },
    /// Synthetic fBm simplex elevation, for running without real tiles.
    Noise {
        /// Noise seed.
        seed: u64,
        /// Number of octaves.
        octaves: u32,
        /// Amplitude of the first octave, in metres.
        amplitude: f64,
        /// Frequency of the first octave, in cycles per metre.
        base_frequency: f64,
        /// Constant added to every sample, in metres.
        offset: f64,
    },
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self::Noise {
            seed: 0,
            octaves: 5,
            amplitude: 64.0,
            base_frequency: 0.002,
            offset: 16.0,
        }
    }
}

/// Structure and populator toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StructureConfig {
    /// Carve noise caves below the surface.
    pub caves: bool,
    /// Place structure templates at tagged features.
    pub custom_structures: bool,
    /// Directory holding `<key>/<value>.ron` structure templates.
    pub structure_dir: PathBuf,
    /// Feature tag keys that may resolve to a structure template.
    pub placeable_tags: Vec<String>,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            caves: true,
            custom_structures: true,
            structure_dir: PathBuf::from("structures"),
            placeable_tags: ["amenity", "leisure", "tourism", "shop"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Column data cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds without access after which a completed column is evicted.
    pub idle_timeout_secs: u64,
    /// Upper bound on completed columns held at once.
    pub max_entries: usize,
    /// Approximate upper bound on memory held by completed columns, in bytes.
    pub max_bytes: usize,
    /// Loader worker threads. 0 picks a count from the number of CPUs.
    pub worker_threads: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 300,
            max_entries: 4096,
            max_bytes: 64 * 1024 * 1024,
            worker_threads: 0,
        }
    }
}

/// What the hosting chunk-loading system can do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// The host announces columns/cubes before it needs them synchronously.
    pub async_prefetch: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            async_prefetch: true,
        }
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "earthgen_terrain=trace").
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            projection: ProjectionConfig::default(),
            elevation: ElevationConfig::default(),
            features_file: None,
            structures: StructureConfig::default(),
        }
    }
}

/// Platform config directory for earthgen, falling back to `./earthgen`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("earthgen")
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-read the file: returns `Some(new_config)` if it changed, `None` otherwise.
    ///
    /// Generator settings are fixed for the lifetime of a world; callers
    /// should only apply the cache/debug sections of a reloaded config.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
