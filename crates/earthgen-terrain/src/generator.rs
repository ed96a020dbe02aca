//! The generation orchestrator: turns a cube request into rasterized,
//! decorated blocks.

use std::sync::Arc;

use earthgen_config::{Config, HostConfig};
use earthgen_voxel::{CUBE_SIZE, CubePos, CubePrimer, CubeWriter};
use tracing::{debug, warn};

use crate::cache::{CacheOptions, ChunkDataCache};
use crate::cave::{CaveCarver, CaveConfig};
use crate::descriptor::ColumnDescriptor;
use crate::loader::{ChunkDataLoader, is_null_island};
use crate::placer::{DirectoryStructureLibrary, StructurePlacer};
use crate::prefetch::PrefetchHook;
use crate::seed::cube_rng;
use crate::structure::{GenerationObserver, Populator, StructureGenerator};
use crate::{GenerationError, GeneratorSettings, SettingsError};

/// Shown to operators when the host cannot prefetch columns.
pub const NO_ASYNC_PREFETCH_NOTICE: &str = "The host does not support asynchronous terrain \
    loading. Every column will be computed on the thread that generates it, which costs \
    significant performance.";

/// What the host runtime can do, declared once at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostCapabilities {
    /// The host will call a [`PrefetchHook`] ahead of generation.
    pub async_prefetch: bool,
}

impl HostCapabilities {
    pub fn from_config(config: &HostConfig) -> Self {
        Self {
            async_prefetch: config.async_prefetch,
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self { async_prefetch: true }
    }
}

/// Writes every voxel of `cube` from the column description.
pub fn rasterize(column: &ColumnDescriptor, cube: CubePos, target: &mut dyn CubeWriter) {
    let (bx, by, bz) = cube.min_block();
    for ly in 0..CUBE_SIZE {
        let y = by + ly as i32;
        for lz in 0..CUBE_SIZE {
            for lx in 0..CUBE_SIZE {
                let state = column.block_state(bx + lx as i32, y, bz + lz as i32);
                target.set_block(lx, ly, lz, state);
            }
        }
    }
}

pub struct EarthGenerator {
    settings: Arc<GeneratorSettings>,
    cache: Arc<ChunkDataCache>,
    capabilities: HostCapabilities,
    structure_generators: Vec<Box<dyn StructureGenerator>>,
    populators: Vec<Box<dyn Populator>>,
    observers: Vec<Arc<dyn GenerationObserver>>,
}

impl EarthGenerator {
    /// Builds a generator with its own column cache and the structure
    /// generators and populators enabled in the settings.
    pub fn new(
        settings: Arc<GeneratorSettings>,
        options: CacheOptions,
        capabilities: HostCapabilities,
    ) -> Self {
        let loader = Arc::new(ChunkDataLoader::new(settings.clone()));
        let cache = Arc::new(ChunkDataCache::new(loader, options));
        Self::with_cache(settings, cache, capabilities)
    }

    /// Like [`Self::new`] over an existing cache.
    pub fn with_cache(
        settings: Arc<GeneratorSettings>,
        cache: Arc<ChunkDataCache>,
        capabilities: HostCapabilities,
    ) -> Self {
        if !capabilities.async_prefetch {
            warn!("{NO_ASYNC_PREFETCH_NOTICE}");
        }

        let structures = settings.structures();
        let mut structure_generators: Vec<Box<dyn StructureGenerator>> = Vec::new();
        if structures.caves {
            structure_generators.push(Box::new(CaveCarver::new(CaveConfig {
                seed: settings.seed(),
                ..CaveConfig::default()
            })));
        }
        let mut populators: Vec<Box<dyn Populator>> = Vec::new();
        if structures.custom_structures {
            if !structures.structure_dir.is_dir() {
                debug!(
                    dir = %structures.structure_dir.display(),
                    "structure directory missing, features will not be decorated"
                );
            }
            let library =
                DirectoryStructureLibrary::new(&structures.structure_dir, settings.blocks().clone());
            populators.push(Box::new(StructurePlacer::new(
                Arc::new(library),
                structures.placeable_tags.clone(),
            )));
        }

        Self {
            settings,
            cache,
            capabilities,
            structure_generators,
            populators,
            observers: Vec::new(),
        }
    }

    /// Builds settings, cache, and generator from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Result<Self, SettingsError> {
        let settings = Arc::new(GeneratorSettings::from_config(&config.generator)?);
        Ok(Self::new(
            settings,
            CacheOptions::from_config(&config.cache),
            HostCapabilities::from_config(&config.host),
        ))
    }

    pub fn with_structure_generator(mut self, generator: impl StructureGenerator + 'static) -> Self {
        self.structure_generators.push(Box::new(generator));
        self
    }

    pub fn with_populator(mut self, populator: impl Populator + 'static) -> Self {
        self.populators.push(Box::new(populator));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn GenerationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn settings(&self) -> &Arc<GeneratorSettings> {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<ChunkDataCache> {
        &self.cache
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    /// Names of the registered structure generators, in run order.
    pub fn structure_generator_names(&self) -> Vec<&str> {
        self.structure_generators.iter().map(|g| g.name()).collect()
    }

    /// Names of the registered populators, in run order.
    pub fn populator_names(&self) -> Vec<&str> {
        self.populators.iter().map(|p| p.name()).collect()
    }

    /// The hook a host calls ahead of generation, if it declared support.
    pub fn prefetch_hook(&self) -> Option<PrefetchHook> {
        self.capabilities
            .async_prefetch
            .then(|| PrefetchHook::new(self.cache.clone()))
    }

    /// A message worth showing to operators, if any.
    pub fn operator_notice(&self) -> Option<&'static str> {
        (!self.capabilities.async_prefetch).then_some(NO_ASYNC_PREFETCH_NOTICE)
    }

    /// Full generation of one cube: terrain, structures, then populators.
    ///
    /// Blocks until the column is available. Cubes in the null-island
    /// region are left untouched and fire no observer events.
    pub fn generate(&self, cube: CubePos, target: &mut dyn CubeWriter) -> Result<(), GenerationError> {
        if is_null_island(cube.x, cube.z) {
            return Ok(());
        }
        for observer in &self.observers {
            observer.before_generate(cube);
        }

        let column = self.cache.get_blocking(cube.chunk_pos())?;
        rasterize(&column, cube, target);

        let mut rng = cube_rng(self.settings.seed(), cube);
        for generator in &self.structure_generators {
            generator.generate(cube, target, &column, &mut rng);
        }
        for populator in &self.populators {
            populator.populate(cube, target, &column, &self.settings);
        }

        for observer in &self.observers {
            observer.after_generate(cube);
        }
        Ok(())
    }

    /// [`Self::generate`] into a fresh primer.
    pub fn generate_cube(&self, cube: CubePos) -> Result<CubePrimer, GenerationError> {
        let mut primer = CubePrimer::empty();
        self.generate(cube, &mut primer)?;
        Ok(primer)
    }

    /// Terrain only: no structures, populators, or observer events.
    pub fn generate_terrain(&self, cube: CubePos, target: &mut dyn CubeWriter) -> Result<(), GenerationError> {
        if is_null_island(cube.x, cube.z) {
            return Ok(());
        }
        let column = self.cache.get_blocking(cube.chunk_pos())?;
        rasterize(&column, cube, target);
        Ok(())
    }

    /// Lets every structure generator rebuild its bookkeeping for a cube
    /// loaded from storage.
    pub fn recreate_structures(&self, cube: CubePos) {
        for generator in &self.structure_generators {
            generator.recreate(cube);
        }
    }
}

impl std::fmt::Debug for EarthGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EarthGenerator")
            .field("settings", &self.settings)
            .field("capabilities", &self.capabilities)
            .field("structure_generators", &self.structure_generator_names())
            .field("populators", &self.populator_names())
            .field("observers", &self.observers.len())
            .finish()
    }
}
