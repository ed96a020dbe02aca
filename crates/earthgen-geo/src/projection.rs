//! Map projections between the block grid and longitude/latitude.
//!
//! Block `x` grows east and block `z` grows south, so north is `-z`. All
//! trigonometry goes through `libm` so results are identical on every
//! platform; the column computer relies on that for reproducibility.

use crate::point::GeoPoint;

/// Failure to map a coordinate through a projection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    /// The block position has no geographic counterpart.
    #[error("block position ({x}, {z}) is outside the projection's bounds")]
    OutOfBounds {
        /// Block X.
        x: f64,
        /// Block Z.
        z: f64,
    },
    /// The geographic point is outside the projection's domain.
    #[error("point ({lon}, {lat}) is outside the projection's domain")]
    OutOfDomain {
        /// Longitude in degrees.
        lon: f64,
        /// Latitude in degrees.
        lat: f64,
    },
}

/// A pure, thread-safe mapping between block space and the globe.
pub trait GeographicProjection: Send + Sync {
    /// Block position → geographic point.
    fn to_geo(&self, x: f64, z: f64) -> Result<GeoPoint, ProjectionError>;

    /// Geographic point → block position `(x, z)`.
    fn from_geo(&self, point: GeoPoint) -> Result<(f64, f64), ProjectionError>;
}

fn check_domain(point: GeoPoint) -> Result<(), ProjectionError> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(ProjectionError::OutOfDomain {
            lon: point.lon,
            lat: point.lat,
        })
    }
}

/// Plate carrée: longitude and latitude scale linearly onto the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Equirectangular {
    blocks_per_degree: f64,
}

impl Equirectangular {
    /// A projection with the given scale.
    pub fn new(blocks_per_degree: f64) -> Self {
        Self { blocks_per_degree }
    }
}

impl GeographicProjection for Equirectangular {
    fn to_geo(&self, x: f64, z: f64) -> Result<GeoPoint, ProjectionError> {
        let point = GeoPoint::new(x / self.blocks_per_degree, -z / self.blocks_per_degree);
        if point.is_valid() {
            Ok(point)
        } else {
            Err(ProjectionError::OutOfBounds { x, z })
        }
    }

    fn from_geo(&self, point: GeoPoint) -> Result<(f64, f64), ProjectionError> {
        check_domain(point)?;
        Ok((
            point.lon * self.blocks_per_degree,
            -point.lat * self.blocks_per_degree,
        ))
    }
}

/// Sinusoidal equal-area projection centred on the prime meridian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sinusoidal {
    blocks_per_degree: f64,
}

impl Sinusoidal {
    /// A projection with the given scale along the central meridian.
    pub fn new(blocks_per_degree: f64) -> Self {
        Self { blocks_per_degree }
    }
}

impl GeographicProjection for Sinusoidal {
    fn to_geo(&self, x: f64, z: f64) -> Result<GeoPoint, ProjectionError> {
        let lat = -z / self.blocks_per_degree;
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ProjectionError::OutOfBounds { x, z });
        }
        let cos_lat = libm::cos(lat.to_radians());
        if cos_lat <= f64::EPSILON {
            // Only the pole itself; every x collapses onto it.
            return if x == 0.0 {
                Ok(GeoPoint::new(0.0, lat))
            } else {
                Err(ProjectionError::OutOfBounds { x, z })
            };
        }
        let point = GeoPoint::new(x / (self.blocks_per_degree * cos_lat), lat);
        if point.is_valid() {
            Ok(point)
        } else {
            Err(ProjectionError::OutOfBounds { x, z })
        }
    }

    fn from_geo(&self, point: GeoPoint) -> Result<(f64, f64), ProjectionError> {
        check_domain(point)?;
        let cos_lat = libm::cos(point.lat.to_radians());
        Ok((
            point.lon * cos_lat * self.blocks_per_degree,
            -point.lat * self.blocks_per_degree,
        ))
    }
}
