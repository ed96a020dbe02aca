//! Geographic collaborators of the terrain pipeline: map projections and
//! elevation/feature datasets, with small reference implementations.

mod dataset;
mod heightmap;
mod point;
mod projection;

pub use dataset::{
    DatasetError, ElevationDataset, FeatureDataset, FlatElevation, NoiseElevation,
    StaticFeatures,
};
pub use heightmap::{HeightmapParams, HeightmapSampler};
pub use point::{GeoBounds, GeoFeature, GeoPoint, GeoPointKey, METERS_PER_DEGREE};
pub use projection::{Equirectangular, GeographicProjection, ProjectionError, Sinusoidal};
