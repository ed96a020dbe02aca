//! Elevation and feature datasets.
//!
//! Real deployments back these traits with tile servers or on-disk rasters;
//! both may be slow and may fail, which is why the cache calls them from its
//! worker pool. Implementations must be deterministic: the same query must
//! always return the same answer.

use std::path::Path;

use serde::Deserialize;

use crate::heightmap::{HeightmapParams, HeightmapSampler};
use crate::point::{GeoBounds, GeoFeature, GeoPoint, METERS_PER_DEGREE};

/// Failure while querying a dataset.
///
/// `Clone` because a single failure is handed to every caller waiting on
/// the same column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    /// Underlying I/O failed.
    #[error("dataset I/O failed: {0}")]
    Io(String),
    /// Data was read but could not be decoded.
    #[error("failed to parse dataset: {0}")]
    Parse(String),
    /// The source is temporarily unreachable.
    #[error("dataset unavailable: {0}")]
    Unavailable(String),
    /// The source answered with the wrong number of samples.
    #[error("dataset returned {actual} samples, expected {expected}")]
    Mismatch {
        /// Number of points queried.
        expected: usize,
        /// Number of samples returned.
        actual: usize,
    },
}

/// Per-point elevation in metres above sea level.
pub trait ElevationDataset: Send + Sync {
    /// One elevation per input point, in order.
    fn elevations(&self, points: &[GeoPoint]) -> Result<Vec<f64>, DatasetError>;
}

/// Tagged point features within a bounding box.
pub trait FeatureDataset: Send + Sync {
    /// All features inside `bounds`, in a stable order.
    fn features(&self, bounds: &GeoBounds) -> Result<Vec<GeoFeature>, DatasetError>;
}

/// Constant elevation everywhere.
#[derive(Clone, Copy, Debug)]
pub struct FlatElevation {
    height: f64,
}

impl FlatElevation {
    /// Every point reports `height` metres.
    pub fn new(height: f64) -> Self {
        Self { height }
    }
}

impl ElevationDataset for FlatElevation {
    fn elevations(&self, points: &[GeoPoint]) -> Result<Vec<f64>, DatasetError> {
        Ok(vec![self.height; points.len()])
    }
}

/// Synthetic elevation from fBm simplex noise sampled in metre space.
pub struct NoiseElevation {
    sampler: HeightmapSampler,
    offset: f64,
}

impl NoiseElevation {
    /// A dataset sampling `params` and adding `offset` metres.
    pub fn new(params: HeightmapParams, offset: f64) -> Self {
        Self {
            sampler: HeightmapSampler::new(params),
            offset,
        }
    }
}

impl ElevationDataset for NoiseElevation {
    fn elevations(&self, points: &[GeoPoint]) -> Result<Vec<f64>, DatasetError> {
        Ok(points
            .iter()
            .map(|p| {
                self.sampler
                    .sample(p.lon * METERS_PER_DEGREE, p.lat * METERS_PER_DEGREE)
                    + self.offset
            })
            .collect())
    }
}

/// An in-memory feature set, optionally loaded from a RON file.
#[derive(Clone, Debug, Default)]
pub struct StaticFeatures {
    features: Vec<GeoFeature>,
}

#[derive(Deserialize)]
struct FeatureFile {
    features: Vec<GeoFeature>,
}

impl StaticFeatures {
    /// No features at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap an existing list. Query results keep this order.
    pub fn new(features: Vec<GeoFeature>) -> Self {
        Self { features }
    }

    /// Load `(features: [...])` from a RON file.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| DatasetError::Io(format!("{}: {e}", path.display())))?;
        let file: FeatureFile = ron::from_str(&contents)
            .map_err(|e| DatasetError::Parse(format!("{}: {e}", path.display())))?;
        tracing::info!(count = file.features.len(), path = %path.display(), "loaded feature set");
        Ok(Self::new(file.features))
    }

    /// Number of features held.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if no features are held.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FeatureDataset for StaticFeatures {
    fn features(&self, bounds: &GeoBounds) -> Result<Vec<GeoFeature>, DatasetError> {
        Ok(self
            .features
            .iter()
            .filter(|f| bounds.contains(f.location()))
            .cloned()
            .collect())
    }
}
