//! Deterministic per-cube random sources.
//!
//! The cube seed is an explicit SplitMix64 mix of the world seed and the cube
//! coordinates, so it is stable across platforms, toolchains, and releases.

use earthgen_voxel::CubePos;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One step of the SplitMix64 finalizer.
#[inline]
pub fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derive a u64 seed for a cube from the world seed and cube position.
pub fn cube_seed(world_seed: u64, cube: CubePos) -> u64 {
    [cube.x, cube.y, cube.z]
        .into_iter()
        .fold(splitmix64(world_seed), |h, c| splitmix64(h ^ u64::from(c as u32)))
}

/// Derive a deterministic RNG for a specific cube.
///
/// The same `(world_seed, cube)` pair always yields the same sequence.
pub fn cube_rng(world_seed: u64, cube: CubePos) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(cube_seed(world_seed, cube))
}
