//! Biome system: registry, classification, and the surface replacer chain.
//!
//! Exact classification rules belong to the host; the climate classifier
//! here is a reasonable default driven by latitude and elevation.

mod classifier;
mod def;
mod registry;
mod replacer;

pub use classifier::{BiomeClassifier, ClimateClassifier};
pub use def::BiomeDef;
pub use registry::{BiomeId, BiomeRegistry, BiomeRegistryError};
pub use replacer::{BiomeSurfaceReplacer, SurfaceBlocks, SurfaceContext, SurfaceReplacer, UnderwaterReplacer};
