//! Extension points run after the terrain of a cube is rasterized.

use earthgen_voxel::{CubePos, CubeWriter};
use rand_chacha::ChaCha8Rng;

use crate::GeneratorSettings;
use crate::descriptor::ColumnDescriptor;

/// Carves or adds large-scale structure (caves, ravines, ...) to a cube.
///
/// Implementations keep no mutable state between calls; all randomness
/// comes from the per-cube `rng`.
pub trait StructureGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(
        &self,
        cube: CubePos,
        target: &mut dyn CubeWriter,
        column: &ColumnDescriptor,
        rng: &mut ChaCha8Rng,
    );

    /// Re-registers structure bookkeeping for a cube loaded from storage.
    /// Has no access to terrain. Most generators have nothing to do here.
    fn recreate(&self, _cube: CubePos) {}
}

/// Decorates a cube after every structure generator has run.
pub trait Populator: Send + Sync {
    fn name(&self) -> &str;

    fn populate(
        &self,
        cube: CubePos,
        target: &mut dyn CubeWriter,
        column: &ColumnDescriptor,
        settings: &GeneratorSettings,
    );
}

/// Notified around each full cube generation.
pub trait GenerationObserver: Send + Sync {
    fn before_generate(&self, _cube: CubePos) {}
    fn after_generate(&self, _cube: CubePos) {}
}
