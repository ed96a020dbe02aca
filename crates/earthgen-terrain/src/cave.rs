//! 3D noise-based cave generation using the Swiss cheese model.
//!
//! Uses multi-octave 3D simplex noise to carve cave systems below the
//! ground of each column. Respects depth bounds and keeps a solid buffer
//! under the sea floor.

use earthgen_voxel::{BlockState, CUBE_SIZE, CubePos, CubeWriter};
use noise::{NoiseFn, Simplex};
use rand_chacha::ChaCha8Rng;

use crate::descriptor::ColumnDescriptor;
use crate::structure::StructureGenerator;

/// Configuration for 3D noise-based cave generation.
#[derive(Clone, Debug)]
pub struct CaveConfig {
    /// World seed for deterministic cave generation.
    pub seed: u64,
    /// Noise threshold. Voxels where `noise_value <= threshold` become air.
    /// Default: -0.15.
    pub threshold: f64,
    /// Number of noise octaves. Default: 3.
    pub octaves: u32,
    /// Base frequency of the cave noise, in cycles per block. Default: 0.02.
    pub frequency: f64,
    /// Lacunarity (frequency multiplier per octave). Default: 2.0.
    pub lacunarity: f64,
    /// Persistence (amplitude multiplier per octave). Default: 0.5.
    pub persistence: f64,
    /// Caves are suppressed more than this many blocks below the ground.
    /// Default: 128.
    pub max_depth: f64,
    /// Minimum depth below the ground before caves can appear, so the
    /// surface never becomes an eggshell. Default: 5.
    pub min_depth: f64,
    /// Solid blocks kept under a sea floor so water cannot drain. Default: 10.
    pub ocean_floor_buffer: f64,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            threshold: -0.15,
            octaves: 3,
            frequency: 0.02,
            lacunarity: 2.0,
            persistence: 0.5,
            max_depth: 128.0,
            min_depth: 5.0,
            ocean_floor_buffer: 10.0,
        }
    }
}

/// Carves cave systems into subsurface volume using 3D simplex noise.
pub struct CaveCarver {
    noise: Simplex,
    config: CaveConfig,
}

impl CaveCarver {
    pub fn new(config: CaveConfig) -> Self {
        // Offset decorrelates cave noise from any terrain noise on the same seed.
        let noise = Simplex::new(config.seed.wrapping_add(0xCAFE_BABE) as u32);
        Self { noise, config }
    }

    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Whether the block at world `(x, y, z)` should be carved out, given
    /// its column's ground and water heights.
    pub fn is_cave(&self, x: i32, y: i32, z: i32, ground: i32, water: i32) -> bool {
        if y >= ground {
            return false;
        }
        let depth = f64::from(ground) - f64::from(y);
        if depth < self.config.min_depth || depth > self.config.max_depth {
            return false;
        }
        if water > ground && depth < self.config.ocean_floor_buffer {
            return false;
        }

        let noise_val = self.sample_cave_noise(f64::from(x), f64::from(y), f64::from(z));

        // Caves thin out towards max_depth.
        let span = self.config.max_depth - self.config.min_depth;
        let depth_factor = 1.0 - ((depth - self.config.min_depth) / span).powi(2);
        noise_val <= self.config.threshold * depth_factor
    }

    fn sample_cave_noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.config.frequency;
        let mut amplitude = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..self.config.octaves {
            total += self.noise.get([x * frequency, y * frequency, z * frequency]) * amplitude;
            max_amplitude += amplitude;
            frequency *= self.config.lacunarity;
            amplitude *= self.config.persistence;
        }

        // Normalize to [-1, 1].
        total / max_amplitude
    }
}

impl StructureGenerator for CaveCarver {
    fn name(&self) -> &str {
        "caves"
    }

    fn generate(
        &self,
        cube: CubePos,
        target: &mut dyn CubeWriter,
        column: &ColumnDescriptor,
        _rng: &mut ChaCha8Rng,
    ) {
        let (bx, by, bz) = cube.min_block();
        let (lowest, highest) = column.height_range();
        let deepest_cave = f64::from(lowest) - self.config.max_depth;
        if by > highest || f64::from(by) + (CUBE_SIZE as f64) < deepest_cave {
            return;
        }
        for lz in 0..CUBE_SIZE {
            for lx in 0..CUBE_SIZE {
                let (x, z) = (bx + lx as i32, bz + lz as i32);
                let ground = column.ground_height(x, z);
                let water = column.water_height(x, z);
                for ly in 0..CUBE_SIZE {
                    let y = by + ly as i32;
                    let current = target.block(lx, ly, lz);
                    if current.is_air() || current == BlockState::WATER {
                        continue;
                    }
                    if self.is_cave(x, y, z, ground, water) {
                        target.set_block(lx, ly, lz, BlockState::AIR);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use earthgen_voxel::{CUBE_VOLUME, CubePrimer};
    use rand::SeedableRng;

    fn default_carver() -> CaveCarver {
        CaveCarver::new(CaveConfig {
            seed: 42,
            ..Default::default()
        })
    }

    #[test]
    fn test_caves_found_underground() {
        let carver = default_carver();
        let found = (0..40)
            .flat_map(|x| (10..90).map(move |d| (x, 100 - d)))
            .any(|(x, y)| carver.is_cave(x * 7, y, 3, 100, 100));
        assert!(found, "Should find at least some cave voxels below the surface");
    }

    #[test]
    fn test_no_caves_above_or_near_surface() {
        let carver = default_carver();
        for x in 0..200 {
            assert!(!carver.is_cave(x, 100, 0, 100, 100), "ground block itself is never carved");
            assert!(!carver.is_cave(x, 120, 0, 100, 100));
            assert!(!carver.is_cave(x, 97, 0, 100, 100), "min_depth keeps the crust intact");
        }
    }

    #[test]
    fn test_no_caves_below_max_depth() {
        let carver = default_carver();
        for x in 0..200 {
            assert!(!carver.is_cave(x, -200, 0, 0, 0));
        }
    }

    #[test]
    fn test_extreme_heights_do_not_overflow() {
        let carver = default_carver();
        assert!(!carver.is_cave(0, i32::MIN, 0, i32::MAX, i32::MAX));
        assert!(!carver.is_cave(0, i32::MAX, 0, i32::MIN, i32::MIN));
        assert!(!carver.is_cave(0, i32::MIN, 0, i32::MIN + 3, i32::MIN), "within min_depth");
    }

    #[test]
    fn test_ocean_floor_buffer() {
        let carver = default_carver();
        for x in 0..500 {
            assert!(
                !carver.is_cave(x, -25, x, -20, -1),
                "caves must not open right under the sea floor"
            );
        }
    }

    #[test]
    fn test_generate_only_carves_solid_blocks() {
        let carver = default_carver();
        let column = crate::test_support::flat_column(40);
        let cube = CubePos::new(0, 1, 0);
        let mut primer = CubePrimer::empty();
        for y in 0..CUBE_SIZE {
            for z in 0..CUBE_SIZE {
                for x in 0..CUBE_SIZE {
                    primer.set_block(x, y, z, column.block_state(x as i32, 16 + y as i32, z as i32));
                }
            }
        }
        let solid_before = CUBE_VOLUME - primer.count(BlockState::AIR);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        carver.generate(cube, &mut primer, &column, &mut rng);
        let solid_after = CUBE_VOLUME - primer.count(BlockState::AIR);
        assert!(solid_after <= solid_before);
        for z in 0..CUBE_SIZE {
            for x in 0..CUBE_SIZE {
                assert_eq!(primer.block(x, 15, z), BlockState::AIR, "y=31 is above ground");
            }
        }
    }
}
