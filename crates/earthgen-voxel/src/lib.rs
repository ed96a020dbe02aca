//! Block states, chunk/cube coordinates, and the cube write surface.

pub mod block;
pub mod coords;
pub mod primer;

pub use block::{BlockRegistry, BlockState, RegistryError};
pub use coords::{CUBE_SIZE, CUBE_VOLUME, ChunkPos, CubePos, block_to_cube, local_to_block};
pub use primer::{CubePrimer, CubeWriter};
