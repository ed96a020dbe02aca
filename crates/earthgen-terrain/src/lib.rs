//! Geographic terrain generation for a cubic-chunk voxel world.
//!
//! A column (16x16 blocks, unbounded height) is computed once from map
//! projection and elevation/feature datasets into a [`ColumnDescriptor`],
//! cached with request coalescing in [`ChunkDataCache`], and rasterized into
//! 16³ cubes by [`EarthGenerator`], which then runs structure generators and
//! populators over each cube.

pub mod biome;
pub mod cache;
pub mod cave;
pub mod descriptor;
mod error;
pub mod generator;
pub mod loader;
pub mod placer;
pub mod prefetch;
pub mod seed;
pub mod settings;
pub mod structure;

#[cfg(test)]
mod test_support;

pub use biome::{
    BiomeClassifier, BiomeDef, BiomeId, BiomeRegistry, BiomeRegistryError, BiomeSurfaceReplacer,
    ClimateClassifier, SurfaceBlocks, SurfaceContext, SurfaceReplacer, UnderwaterReplacer,
};
pub use cache::{CacheOptions, CacheStats, ChunkDataCache, ColumnHandle, ColumnResult};
pub use cave::{CaveCarver, CaveConfig};
pub use descriptor::{
    BLANK_HEIGHT, COLUMN_AREA, ColumnDescriptor, ColumnDescriptorBuilder, FILLER_DEPTH,
    PlacedFeature, WATER_DEPTH_OFFSET,
};
pub use error::{GenerationError, SettingsError, StructureError};
pub use generator::{EarthGenerator, HostCapabilities, NO_ASYNC_PREFETCH_NOTICE, rasterize};
pub use loader::{ChunkDataLoader, ColumnLoader, is_null_island};
pub use placer::{
    DirectoryStructureLibrary, MemoryStructureLibrary, StructureLibrary, StructurePlacer,
    StructureTemplate, TemplateBlock,
};
pub use prefetch::PrefetchHook;
pub use seed::{cube_rng, cube_seed, splitmix64};
pub use settings::{GeneratorSettings, GeneratorSettingsBuilder};
pub use structure::{GenerationObserver, Populator, StructureGenerator};
