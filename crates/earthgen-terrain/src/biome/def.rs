//! Biome definition: describes the properties of a single biome type.

use earthgen_voxel::BlockState;

/// Full descriptor for a biome type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BiomeDef {
    /// Human-readable biome name (e.g., "plains").
    pub name: String,
    /// Block placed on the terrain surface (e.g., grass, sand, snow).
    pub surface_block: BlockState,
    /// Block for the layers immediately below the surface (e.g., dirt).
    pub filler_block: BlockState,
}

impl BiomeDef {
    /// A biome with the given surface and filler blocks.
    pub fn new(name: &str, surface_block: BlockState, filler_block: BlockState) -> Self {
        Self {
            name: name.to_string(),
            surface_block,
            filler_block,
        }
    }
}
