//! Biome classification from geographic position and elevation.

use earthgen_geo::GeoPoint;

use super::{BiomeId, BiomeRegistry};
use crate::SettingsError;

/// Picks the biome for one horizontal cell.
pub trait BiomeClassifier: Send + Sync {
    /// Classifies a cell at `point` whose ground sits at `elevation` metres.
    fn classify(&self, point: GeoPoint, elevation: f64) -> BiomeId;
}

/// Latitude above which land is tundra and ocean freezes.
const POLAR_LATITUDE: f64 = 66.5;
/// Elevation band treated as shoreline.
const BEACH_MAX_ELEVATION: f64 = 3.0;
const MOUNTAIN_ELEVATION: f64 = 1200.0;
const SNOWLINE_ELEVATION: f64 = 2500.0;

/// Default classifier: coarse climate zones by latitude, overridden by
/// elevation bands.
#[derive(Clone, Debug)]
pub struct ClimateClassifier {
    ocean: BiomeId,
    frozen_ocean: BiomeId,
    beach: BiomeId,
    plains: BiomeId,
    forest: BiomeId,
    desert: BiomeId,
    mountains: BiomeId,
    snowy_tundra: BiomeId,
}

impl ClimateClassifier {
    /// Resolves the biome ids this classifier emits.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingBiome`] if the registry lacks one of
    /// the earth biome names (see [`BiomeRegistry::earth`]).
    pub fn new(registry: &BiomeRegistry) -> Result<Self, SettingsError> {
        let id = |name: &str| {
            registry
                .lookup_by_name(name)
                .ok_or_else(|| SettingsError::MissingBiome(name.to_string()))
        };
        Ok(Self {
            ocean: id("ocean")?,
            frozen_ocean: id("frozen_ocean")?,
            beach: id("beach")?,
            plains: id("plains")?,
            forest: id("forest")?,
            desert: id("desert")?,
            mountains: id("mountains")?,
            snowy_tundra: id("snowy_tundra")?,
        })
    }
}

impl BiomeClassifier for ClimateClassifier {
    fn classify(&self, point: GeoPoint, elevation: f64) -> BiomeId {
        let lat = point.lat.abs();
        if elevation < 0.0 {
            return if lat >= POLAR_LATITUDE {
                self.frozen_ocean
            } else {
                self.ocean
            };
        }
        if lat >= POLAR_LATITUDE || elevation >= SNOWLINE_ELEVATION {
            return self.snowy_tundra;
        }
        if elevation >= MOUNTAIN_ELEVATION {
            return self.mountains;
        }
        if elevation < BEACH_MAX_ELEVATION {
            return self.beach;
        }
        match lat {
            l if (15.0..35.0).contains(&l) => self.desert,
            l if l >= 45.0 => self.forest,
            _ => self.plains,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> (BiomeRegistry, ClimateClassifier) {
        let registry = BiomeRegistry::earth();
        let classifier = ClimateClassifier::new(&registry).unwrap();
        (registry, classifier)
    }

    fn name(registry: &BiomeRegistry, id: BiomeId) -> &str {
        &registry.get(id).unwrap().name
    }

    #[test]
    fn test_elevation_bands() {
        let (registry, c) = classifier();
        let p = GeoPoint::new(10.0, 40.0);
        assert_eq!(name(&registry, c.classify(p, -50.0)), "ocean");
        assert_eq!(name(&registry, c.classify(p, 1.0)), "beach");
        assert_eq!(name(&registry, c.classify(p, 100.0)), "plains");
        assert_eq!(name(&registry, c.classify(p, 1500.0)), "mountains");
        assert_eq!(name(&registry, c.classify(p, 3000.0)), "snowy_tundra");
    }

    #[test]
    fn test_latitude_zones() {
        let (registry, c) = classifier();
        assert_eq!(name(&registry, c.classify(GeoPoint::new(0.0, 25.0), 50.0)), "desert");
        assert_eq!(name(&registry, c.classify(GeoPoint::new(0.0, -25.0), 50.0)), "desert");
        assert_eq!(name(&registry, c.classify(GeoPoint::new(0.0, 55.0), 50.0)), "forest");
        assert_eq!(name(&registry, c.classify(GeoPoint::new(0.0, 80.0), -10.0)), "frozen_ocean");
    }

    #[test]
    fn test_missing_biome_rejected() {
        let registry = BiomeRegistry::new();
        let err = ClimateClassifier::new(&registry).unwrap_err();
        assert!(
            matches!(err, SettingsError::MissingBiome(ref n) if n == "ocean"),
            "expected the first missing biome to be reported, got {err}"
        );
    }
}
