//! The 3D write surface terrain is rasterized into.
//!
//! Hosts implement [`CubeWriter`] over their own cube storage; [`CubePrimer`]
//! is the in-memory implementation used when the generator owns the output.

use crate::block::BlockState;
use crate::coords::{CUBE_SIZE, CUBE_VOLUME};

/// A 16³ block volume addressed by local coordinates in `0..16`.
pub trait CubeWriter {
    /// Writes a block state at a local position.
    fn set_block(&mut self, x: usize, y: usize, z: usize, state: BlockState);

    /// Reads the block state at a local position.
    fn block(&self, x: usize, y: usize, z: usize) -> BlockState;
}

/// Dense in-memory cube storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CubePrimer {
    blocks: Box<[BlockState]>,
}

impl CubePrimer {
    /// A cube filled with air.
    pub fn empty() -> Self {
        Self {
            blocks: vec![BlockState::AIR; CUBE_VOLUME].into_boxed_slice(),
        }
    }

    /// Linear index of a local position (x fastest, then z, then y).
    #[inline]
    pub fn index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < CUBE_SIZE && y < CUBE_SIZE && z < CUBE_SIZE);
        (y * CUBE_SIZE + z) * CUBE_SIZE + x
    }

    /// Returns `true` if every block is air.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.is_air())
    }

    /// Number of blocks equal to `state`.
    pub fn count(&self, state: BlockState) -> usize {
        self.blocks.iter().filter(|&&b| b == state).count()
    }

    /// All blocks in index order.
    pub fn blocks(&self) -> &[BlockState] {
        &self.blocks
    }
}

impl Default for CubePrimer {
    fn default() -> Self {
        Self::empty()
    }
}

impl CubeWriter for CubePrimer {
    #[inline]
    fn set_block(&mut self, x: usize, y: usize, z: usize, state: BlockState) {
        self.blocks[Self::index(x, y, z)] = state;
    }

    #[inline]
    fn block(&self, x: usize, y: usize, z: usize) -> BlockState {
        self.blocks[Self::index(x, y, z)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_primer_is_air() {
        let primer = CubePrimer::empty();
        assert!(primer.is_empty());
        assert_eq!(primer.count(BlockState::AIR), CUBE_VOLUME);
    }

    #[test]
    fn test_set_and_get() {
        let mut primer = CubePrimer::empty();
        primer.set_block(15, 0, 3, BlockState::STONE);
        assert_eq!(primer.block(15, 0, 3), BlockState::STONE);
        assert_eq!(primer.block(3, 0, 15), BlockState::AIR);
        assert!(!primer.is_empty());
        assert_eq!(primer.count(BlockState::STONE), 1);
    }

    #[test]
    fn test_index_is_unique() {
        let mut seen = vec![false; CUBE_VOLUME];
        for y in 0..CUBE_SIZE {
            for z in 0..CUBE_SIZE {
                for x in 0..CUBE_SIZE {
                    let i = CubePrimer::index(x, y, z);
                    assert!(!seen[i], "index collision at ({x}, {y}, {z})");
                    seen[i] = true;
                }
            }
        }
    }
}
