//! Horizontal chunk and 3D cube coordinates.
//!
//! A chunk column is 16×16 blocks wide and unbounded vertically; a cube is
//! the 16×16×16 slice of a column at one cube-Y. Block → chunk/cube
//! conversion is always an arithmetic shift, so negative coordinates round
//! towards negative infinity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Side length of a cube (and width of a chunk column) in blocks.
pub const CUBE_SIZE: usize = 16;

/// Blocks in one cube (16³).
pub const CUBE_VOLUME: usize = CUBE_SIZE * CUBE_SIZE * CUBE_SIZE;

const CUBE_SHIFT: i32 = 4;

/// Cube (or chunk) coordinate containing a block coordinate.
#[inline]
pub fn block_to_cube(block: i32) -> i32 {
    block >> CUBE_SHIFT
}

/// World block coordinate of a local offset inside a cube.
#[inline]
pub fn local_to_block(cube: i32, local: usize) -> i32 {
    (cube << CUBE_SHIFT) + local as i32
}

/// Identifies a vertical column of the world.
///
/// Ordered by `x` then `z`, so any iteration over sorted positions is
/// deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    /// Chunk-grid X coordinate.
    pub x: i32,
    /// Chunk-grid Z coordinate.
    pub z: i32,
}

impl ChunkPos {
    /// Creates a new chunk position.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The column containing a block position.
    pub fn from_block(block_x: i32, block_z: i32) -> Self {
        Self::new(block_to_cube(block_x), block_to_cube(block_z))
    }

    /// Block X of the column's west edge.
    pub fn min_block_x(self) -> i32 {
        local_to_block(self.x, 0)
    }

    /// Block Z of the column's north edge.
    pub fn min_block_z(self) -> i32 {
        local_to_block(self.z, 0)
    }

    /// The cube of this column at the given cube-Y.
    pub fn cube(self, y: i32) -> CubePos {
        CubePos::new(self.x, y, self.z)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Identifies a 16³ cube of the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CubePos {
    /// Cube-grid X coordinate.
    pub x: i32,
    /// Cube-grid Y coordinate.
    pub y: i32,
    /// Cube-grid Z coordinate.
    pub z: i32,
}

impl CubePos {
    /// Creates a new cube position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The column this cube belongs to.
    pub fn chunk_pos(self) -> ChunkPos {
        ChunkPos::new(self.x, self.z)
    }

    /// World block coordinate of the cube's minimum corner.
    pub fn min_block(self) -> (i32, i32, i32) {
        (
            local_to_block(self.x, 0),
            local_to_block(self.y, 0),
            local_to_block(self.z, 0),
        )
    }

    /// Whether a world block Y lies inside this cube.
    pub fn contains_block_y(self, block_y: i32) -> bool {
        block_to_cube(block_y) == self.y
    }
}

impl fmt::Display for CubePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}
