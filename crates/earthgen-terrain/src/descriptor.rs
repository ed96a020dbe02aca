//! The per-column terrain description produced by the loader and consumed
//! by rasterization and populators.

use std::collections::BTreeMap;
use std::mem;

use earthgen_voxel::{BlockState, CUBE_SIZE};

use crate::biome::{BiomeId, SurfaceBlocks};

/// Number of horizontal cells in a column.
pub const COLUMN_AREA: usize = CUBE_SIZE * CUBE_SIZE;

/// Ground height of every cell of a blank column.
pub const BLANK_HEIGHT: i32 = -1;

/// Layers of filler block below the surface block before stone begins.
pub const FILLER_DEPTH: i32 = 3;

/// Ocean cells are filled with water up to `-WATER_DEPTH_OFFSET`.
pub const WATER_DEPTH_OFFSET: i32 = 1;

/// A tagged map feature that fell inside the column.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlacedFeature {
    /// World block x.
    pub x: i32,
    /// World block z.
    pub z: i32,
    pub tags: BTreeMap<String, String>,
}

/// Everything needed to rasterize any cube of one 16x16 column.
///
/// Cells are addressed by local `(x, z)` in `0..16`; lookups taking world
/// block coordinates mask them to the column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDescriptor {
    ground: [i32; COLUMN_AREA],
    water: [i32; COLUMN_AREA],
    biomes: [BiomeId; COLUMN_AREA],
    surface: [BlockState; COLUMN_AREA],
    filler: [BlockState; COLUMN_AREA],
    features: Vec<PlacedFeature>,
}

#[inline]
fn cell(x: i32, z: i32) -> usize {
    ((z & 15) as usize) * CUBE_SIZE + (x & 15) as usize
}

impl ColumnDescriptor {
    /// The trivial column: flat stone at [`BLANK_HEIGHT`], no water, the
    /// default biome, no features.
    pub fn blank() -> Self {
        Self {
            ground: [BLANK_HEIGHT; COLUMN_AREA],
            water: [BLANK_HEIGHT; COLUMN_AREA],
            biomes: [BiomeId::default(); COLUMN_AREA],
            surface: [BlockState::STONE; COLUMN_AREA],
            filler: [BlockState::STONE; COLUMN_AREA],
            features: Vec::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::blank()
    }

    pub fn ground_height(&self, x: i32, z: i32) -> i32 {
        self.ground[cell(x, z)]
    }

    pub fn water_height(&self, x: i32, z: i32) -> i32 {
        self.water[cell(x, z)]
    }

    pub fn biome(&self, x: i32, z: i32) -> BiomeId {
        self.biomes[cell(x, z)]
    }

    pub fn surface_block(&self, x: i32, z: i32) -> BlockState {
        self.surface[cell(x, z)]
    }

    pub fn filler_block(&self, x: i32, z: i32) -> BlockState {
        self.filler[cell(x, z)]
    }

    pub fn features(&self) -> &[PlacedFeature] {
        &self.features
    }

    /// The block at world coordinates `(x, y, z)`. `x` and `z` are masked
    /// to this column; any `y` is valid.
    pub fn block_state(&self, x: i32, y: i32, z: i32) -> BlockState {
        let i = cell(x, z);
        let ground = self.ground[i];
        if y > ground {
            if y <= self.water[i] {
                BlockState::WATER
            } else {
                BlockState::AIR
            }
        } else if y == ground {
            self.surface[i]
        } else if ground.saturating_sub(y) <= FILLER_DEPTH {
            self.filler[i]
        } else {
            BlockState::STONE
        }
    }

    /// Lowest and highest ground heights in the column.
    pub fn height_range(&self) -> (i32, i32) {
        self.ground
            .iter()
            .fold((i32::MAX, i32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }

    /// Rough memory footprint, used for the cache's byte budget.
    pub fn approx_bytes(&self) -> usize {
        let tags: usize = self
            .features
            .iter()
            .flat_map(|f| f.tags.iter())
            .map(|(k, v)| k.len() + v.len() + 2 * mem::size_of::<String>())
            .sum();
        mem::size_of::<Self>() + self.features.capacity() * mem::size_of::<PlacedFeature>() + tags
    }
}

/// Mutable staging area for a [`ColumnDescriptor`]. Starts out blank.
#[derive(Clone, Debug)]
pub struct ColumnDescriptorBuilder {
    inner: ColumnDescriptor,
}

impl ColumnDescriptorBuilder {
    pub fn new() -> Self {
        Self {
            inner: ColumnDescriptor::blank(),
        }
    }

    pub fn set_ground(&mut self, x: i32, z: i32, height: i32) -> &mut Self {
        self.inner.ground[cell(x, z)] = height;
        self
    }

    pub fn set_water(&mut self, x: i32, z: i32, height: i32) -> &mut Self {
        self.inner.water[cell(x, z)] = height;
        self
    }

    pub fn set_biome(&mut self, x: i32, z: i32, biome: BiomeId) -> &mut Self {
        self.inner.biomes[cell(x, z)] = biome;
        self
    }

    pub fn set_surface(&mut self, x: i32, z: i32, blocks: SurfaceBlocks) -> &mut Self {
        let i = cell(x, z);
        self.inner.surface[i] = blocks.surface;
        self.inner.filler[i] = blocks.filler;
        self
    }

    pub fn push_feature(&mut self, feature: PlacedFeature) -> &mut Self {
        self.inner.features.push(feature);
        self
    }

    /// Finishes the column. Features are sorted so equal inputs build equal
    /// descriptors regardless of dataset ordering.
    pub fn build(self) -> ColumnDescriptor {
        let mut inner = self.inner;
        inner.features.sort();
        inner.features.shrink_to_fit();
        inner
    }
}

impl Default for ColumnDescriptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass() -> SurfaceBlocks {
        SurfaceBlocks {
            surface: BlockState::GRASS,
            filler: BlockState::DIRT,
        }
    }

    #[test]
    fn test_blank_is_blank() {
        let blank = ColumnDescriptor::blank();
        assert!(blank.is_blank());
        assert_eq!(blank.ground_height(7, 7), BLANK_HEIGHT);
        assert_eq!(blank.block_state(0, BLANK_HEIGHT + 1, 0), BlockState::AIR);
        assert_eq!(blank.block_state(0, BLANK_HEIGHT, 0), BlockState::STONE);
        assert!(blank.features().is_empty());
    }

    #[test]
    fn test_block_state_layers() {
        let mut b = ColumnDescriptorBuilder::new();
        b.set_ground(2, 3, 10).set_surface(2, 3, grass());
        let desc = b.build();
        assert!(!desc.is_blank());
        assert_eq!(desc.block_state(2, 11, 3), BlockState::AIR);
        assert_eq!(desc.block_state(2, 10, 3), BlockState::GRASS);
        for y in 7..10 {
            assert_eq!(desc.block_state(2, y, 3), BlockState::DIRT, "filler at y={y}");
        }
        assert_eq!(desc.block_state(2, 6, 3), BlockState::STONE);
        assert_eq!(desc.block_state(2, -1000, 3), BlockState::STONE);
    }

    #[test]
    fn test_block_state_masks_world_coordinates() {
        let mut b = ColumnDescriptorBuilder::new();
        b.set_ground(1, 2, 40);
        let desc = b.build();
        // Block (-15, -14) is local cell (1, 2) of chunk (-1, -1).
        assert_eq!(desc.ground_height(-15, -14), 40);
        assert_eq!(desc.ground_height(33, 18), 40);
    }

    #[test]
    fn test_block_state_at_extreme_heights() {
        let mut b = ColumnDescriptorBuilder::new();
        b.set_ground(0, 0, i32::MAX).set_surface(0, 0, grass());
        b.set_ground(1, 0, i32::MIN).set_surface(1, 0, grass());
        let desc = b.build();
        assert_eq!(desc.block_state(0, i32::MIN, 0), BlockState::STONE);
        assert_eq!(desc.block_state(0, i32::MAX, 0), BlockState::GRASS);
        assert_eq!(desc.block_state(0, i32::MAX - 3, 0), BlockState::DIRT);
        assert_eq!(desc.block_state(1, i32::MIN, 0), BlockState::GRASS);
        assert_eq!(desc.block_state(1, i32::MAX, 0), BlockState::AIR);
        assert_eq!(desc.block_state(5, i32::MIN, 5), BlockState::STONE);
    }

    #[test]
    fn test_water_above_ground() {
        let mut b = ColumnDescriptorBuilder::new();
        b.set_ground(0, 0, -10).set_water(0, 0, -WATER_DEPTH_OFFSET);
        let desc = b.build();
        assert_eq!(desc.block_state(0, -5, 0), BlockState::WATER);
        assert_eq!(desc.block_state(0, -1, 0), BlockState::WATER);
        assert_eq!(desc.block_state(0, 0, 0), BlockState::AIR);
    }

    #[test]
    fn test_features_sorted_for_equality() {
        let a = PlacedFeature {
            x: 1,
            z: 1,
            tags: BTreeMap::from([("shop".to_string(), "bakery".to_string())]),
        };
        let b = PlacedFeature {
            x: 5,
            z: 0,
            tags: BTreeMap::new(),
        };
        let mut first = ColumnDescriptorBuilder::new();
        first.push_feature(a.clone()).push_feature(b.clone());
        let mut second = ColumnDescriptorBuilder::new();
        second.push_feature(b).push_feature(a);
        assert_eq!(first.build(), second.build(), "feature order must not matter");
    }

    #[test]
    fn test_height_range_and_bytes() {
        let mut b = ColumnDescriptorBuilder::new();
        b.set_ground(0, 0, 90).set_ground(15, 15, -20);
        let desc = b.build();
        assert_eq!(desc.height_range(), (-20, 90));
        assert!(desc.approx_bytes() >= mem::size_of::<ColumnDescriptor>());
    }
}
