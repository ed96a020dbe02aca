//! Column computation: turns a chunk coordinate into a [`ColumnDescriptor`]
//! by querying the geographic datasets.

use std::sync::Arc;
use std::time::Instant;

use earthgen_geo::{DatasetError, GeoBounds, GeoPoint};
use earthgen_voxel::{CUBE_SIZE, ChunkPos};
use tracing::debug;

use crate::biome::{SurfaceBlocks, SurfaceContext};
use crate::descriptor::{
    COLUMN_AREA, ColumnDescriptor, ColumnDescriptorBuilder, PlacedFeature, WATER_DEPTH_OFFSET,
};
use crate::{GenerationError, GeneratorSettings};

/// Computes the descriptor for one column. Must be pure in its inputs:
/// the same position always yields an equal descriptor.
pub trait ColumnLoader: Send + Sync {
    fn load(&self, pos: ChunkPos) -> Result<ColumnDescriptor, GenerationError>;
}

/// Chunks within this Chebyshev radius of the origin are never generated.
const NULL_ISLAND_RADIUS: i32 = 3;

/// True for the few chunks around (0, 0) that stay blank.
///
/// `x ^ (x >> 31)` folds negative coordinates onto `-x - 1`, so the region
/// is the 6x6 square from -3 to 2 on each axis.
pub fn is_null_island(x: i32, z: i32) -> bool {
    (x ^ (x >> 31)).max(z ^ (z >> 31)) < NULL_ISLAND_RADIUS
}

/// The production loader, driven entirely by [`GeneratorSettings`].
#[derive(Clone, Debug)]
pub struct ChunkDataLoader {
    settings: Arc<GeneratorSettings>,
}

impl ChunkDataLoader {
    pub fn new(settings: Arc<GeneratorSettings>) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Arc<GeneratorSettings> {
        &self.settings
    }

    fn cell_points(&self, pos: ChunkPos) -> Option<Vec<GeoPoint>> {
        let projection = self.settings.projection();
        let mut points = Vec::with_capacity(COLUMN_AREA);
        for lz in 0..CUBE_SIZE as i32 {
            for lx in 0..CUBE_SIZE as i32 {
                let x = f64::from(pos.min_block_x() + lx) + 0.5;
                let z = f64::from(pos.min_block_z() + lz) + 0.5;
                match projection.to_geo(x, z) {
                    Ok(point) => points.push(point),
                    Err(err) => {
                        debug!(%pos, error = %err, "column outside projection, leaving it blank");
                        return None;
                    }
                }
            }
        }
        Some(points)
    }

    fn placed_features(
        &self,
        pos: ChunkPos,
        points: &[GeoPoint],
    ) -> Result<Vec<PlacedFeature>, GenerationError> {
        let Some(bounds) = GeoBounds::from_points(points) else {
            return Ok(Vec::new());
        };
        // Cell centres sit half a block inside the column edge.
        let span = (bounds.max_lon - bounds.min_lon).max(bounds.max_lat - bounds.min_lat);
        let bounds = bounds.expand(span / CUBE_SIZE as f64);
        let features = self
            .settings
            .features()
            .features(&bounds)
            .map_err(|source| GenerationError::Dataset { pos, source })?;

        let projection = self.settings.projection();
        let placed = features
            .into_iter()
            .filter_map(|feature| {
                let (x, z) = projection.from_geo(feature.location()).ok()?;
                let (x, z) = (x.floor() as i32, z.floor() as i32);
                (ChunkPos::from_block(x, z) == pos).then_some(PlacedFeature {
                    x,
                    z,
                    tags: feature.tags,
                })
            })
            .collect();
        Ok(placed)
    }
}

impl ColumnLoader for ChunkDataLoader {
    fn load(&self, pos: ChunkPos) -> Result<ColumnDescriptor, GenerationError> {
        if is_null_island(pos.x, pos.z) {
            return Ok(ColumnDescriptor::blank());
        }
        let start = Instant::now();
        let Some(points) = self.cell_points(pos) else {
            return Ok(ColumnDescriptor::blank());
        };

        let elevations = self
            .settings
            .elevation()
            .elevations(&points)
            .map_err(|source| GenerationError::Dataset { pos, source })?;
        if elevations.len() != points.len() {
            return Err(GenerationError::Dataset {
                pos,
                source: DatasetError::Mismatch {
                    expected: points.len(),
                    actual: elevations.len(),
                },
            });
        }
        let features = self.placed_features(pos, &points)?;

        let mut builder = ColumnDescriptorBuilder::new();
        for (i, (&point, &elevation)) in points.iter().zip(&elevations).enumerate() {
            let x = (i % CUBE_SIZE) as i32;
            let z = (i / CUBE_SIZE) as i32;
            // Holes in the data read as sea level.
            let elevation = if elevation.is_finite() { elevation } else { 0.0 };
            let ground = elevation.floor() as i32;
            let water = if ground < 0 { -WATER_DEPTH_OFFSET } else { ground };
            let biome = self.settings.classifier().classify(point, elevation);

            let ctx = SurfaceContext {
                point,
                biome,
                ground_height: ground,
                water_height: water,
            };
            let blocks = self
                .settings
                .replacers()
                .iter()
                .fold(SurfaceBlocks::STONE, |blocks, r| r.replace(&ctx, blocks));

            builder
                .set_ground(x, z, ground)
                .set_water(x, z, water)
                .set_biome(x, z, biome)
                .set_surface(x, z, blocks);
        }
        for feature in features {
            builder.push_feature(feature);
        }
        let descriptor = builder.build();

        debug!(
            %pos,
            features = descriptor.features().len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "computed column"
        );
        Ok(descriptor)
    }
}
