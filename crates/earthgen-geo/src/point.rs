//! Geographic points, bounding boxes, and tagged features.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Approximate length of one degree of arc on the equator, in metres.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// A longitude/latitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees, positive east. Valid range: \[-180, 180\].
    pub lon: f64,
    /// Latitude in degrees, positive north. Valid range: \[-90, 90\].
    pub lat: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns `true` if both components are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

/// An axis-aligned longitude/latitude box. Does not wrap the antimeridian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds {
    /// Western edge.
    pub min_lon: f64,
    /// Southern edge.
    pub min_lat: f64,
    /// Eastern edge.
    pub max_lon: f64,
    /// Northern edge.
    pub max_lat: f64,
}

impl GeoBounds {
    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        for p in &points[1..] {
            bounds.min_lon = bounds.min_lon.min(p.lon);
            bounds.min_lat = bounds.min_lat.min(p.lat);
            bounds.max_lon = bounds.max_lon.max(p.lon);
            bounds.max_lat = bounds.max_lat.max(p.lat);
        }
        Some(bounds)
    }

    /// Grows the box by `margin` degrees on every side.
    pub fn expand(self, margin: f64) -> Self {
        Self {
            min_lon: self.min_lon - margin,
            min_lat: self.min_lat - margin,
            max_lon: self.max_lon + margin,
            max_lat: self.max_lat + margin,
        }
    }

    /// Returns `true` if the point lies inside or on the edge.
    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lon >= self.min_lon && p.lon <= self.max_lon && p.lat >= self.min_lat && p.lat <= self.max_lat
    }
}

/// A tagged point feature (a shop, a park, a monument, ...).
///
/// Tags are kept in a `BTreeMap` so iteration order, and therefore
/// everything derived from it, is stable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoFeature {
    /// Where the feature is.
    pub point: GeoPointKey,
    /// Key/value tags, e.g. `amenity = "townhall"`.
    pub tags: BTreeMap<String, String>,
}

/// A [`GeoPoint`] stored as fixed-point micro-degrees so features can be `Eq`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeoPointKey {
    /// Longitude in millionths of a degree.
    pub lon_e6: i64,
    /// Latitude in millionths of a degree.
    pub lat_e6: i64,
}

impl GeoPointKey {
    /// Rounds a point to micro-degree precision.
    pub fn from_point(p: GeoPoint) -> Self {
        Self {
            lon_e6: (p.lon * 1e6).round() as i64,
            lat_e6: (p.lat * 1e6).round() as i64,
        }
    }

    /// The point in degrees.
    pub fn to_point(self) -> GeoPoint {
        GeoPoint::new(self.lon_e6 as f64 / 1e6, self.lat_e6 as f64 / 1e6)
    }
}

impl GeoFeature {
    /// A feature at `point` with the given tags.
    pub fn new<I, K, V>(point: GeoPoint, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            point: GeoPointKey::from_point(point),
            tags: tags.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Location in degrees.
    pub fn location(&self) -> GeoPoint {
        self.point.to_point()
    }
}
