//! The surface replacer chain.
//!
//! Each replacer sees the blocks chosen so far for a cell and may swap them.
//! Replacers run in registration order; the first one starts from stone.

use std::sync::Arc;

use earthgen_geo::GeoPoint;
use earthgen_voxel::BlockState;

use super::{BiomeId, BiomeRegistry};

/// Inputs a replacer may inspect for one cell.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceContext {
    pub point: GeoPoint,
    pub biome: BiomeId,
    pub ground_height: i32,
    pub water_height: i32,
}

impl SurfaceContext {
    /// Depth of water above the ground, zero on dry land.
    pub fn water_depth(&self) -> i32 {
        (self.water_height - self.ground_height).max(0)
    }
}

/// The top block and the block layered directly below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceBlocks {
    pub surface: BlockState,
    pub filler: BlockState,
}

impl SurfaceBlocks {
    /// Bare rock, the value the chain starts from.
    pub const STONE: Self = Self {
        surface: BlockState::STONE,
        filler: BlockState::STONE,
    };
}

pub trait SurfaceReplacer: Send + Sync {
    fn replace(&self, ctx: &SurfaceContext, current: SurfaceBlocks) -> SurfaceBlocks;
}

/// Applies the blocks declared by the cell's biome.
#[derive(Clone, Debug)]
pub struct BiomeSurfaceReplacer {
    registry: Arc<BiomeRegistry>,
}

impl BiomeSurfaceReplacer {
    pub fn new(registry: Arc<BiomeRegistry>) -> Self {
        Self { registry }
    }
}

impl SurfaceReplacer for BiomeSurfaceReplacer {
    fn replace(&self, ctx: &SurfaceContext, current: SurfaceBlocks) -> SurfaceBlocks {
        match self.registry.get(ctx.biome) {
            Some(def) => SurfaceBlocks {
                surface: def.surface_block,
                filler: def.filler_block,
            },
            None => current,
        }
    }
}

/// Shallow sea floors become sand, deeper ones gravel.
#[derive(Clone, Copy, Debug)]
pub struct UnderwaterReplacer {
    pub shallow_depth: i32,
}

impl Default for UnderwaterReplacer {
    fn default() -> Self {
        Self { shallow_depth: 3 }
    }
}

impl SurfaceReplacer for UnderwaterReplacer {
    fn replace(&self, ctx: &SurfaceContext, current: SurfaceBlocks) -> SurfaceBlocks {
        let depth = ctx.water_depth();
        if depth == 0 {
            current
        } else if depth <= self.shallow_depth {
            SurfaceBlocks {
                surface: BlockState::SAND,
                filler: BlockState::SAND,
            }
        } else {
            SurfaceBlocks {
                surface: BlockState::GRAVEL,
                filler: current.filler,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(biome: BiomeId, ground: i32, water: i32) -> SurfaceContext {
        SurfaceContext {
            point: GeoPoint::new(0.0, 0.0),
            biome,
            ground_height: ground,
            water_height: water,
        }
    }

    #[test]
    fn test_biome_replacer_uses_definition() {
        let registry = Arc::new(BiomeRegistry::earth());
        let plains = registry.lookup_by_name("plains").unwrap();
        let replacer = BiomeSurfaceReplacer::new(registry);
        let out = replacer.replace(&ctx(plains, 10, 10), SurfaceBlocks::STONE);
        assert_eq!(out.surface, BlockState::GRASS);
        assert_eq!(out.filler, BlockState::DIRT);
    }

    #[test]
    fn test_biome_replacer_keeps_unknown_biome() {
        let replacer = BiomeSurfaceReplacer::new(Arc::new(BiomeRegistry::new()));
        let out = replacer.replace(&ctx(BiomeId(3), 10, 10), SurfaceBlocks::STONE);
        assert_eq!(out, SurfaceBlocks::STONE);
    }

    #[test]
    fn test_underwater_replacer_by_depth() {
        let replacer = UnderwaterReplacer::default();
        let dirt = SurfaceBlocks {
            surface: BlockState::GRASS,
            filler: BlockState::DIRT,
        };
        assert_eq!(replacer.replace(&ctx(BiomeId(0), 5, 5), dirt), dirt, "dry land is untouched");
        assert_eq!(replacer.replace(&ctx(BiomeId(0), -3, -1), dirt).surface, BlockState::SAND);
        let deep = replacer.replace(&ctx(BiomeId(0), -40, -1), dirt);
        assert_eq!(deep.surface, BlockState::GRAVEL);
        assert_eq!(deep.filler, BlockState::DIRT);
    }
}
