//! Immutable generator settings shared by the cache, loader, and
//! orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use earthgen_config::{ElevationConfig, GeneratorConfig, ProjectionConfig, StructureConfig};
use earthgen_geo::{
    ElevationDataset, Equirectangular, FeatureDataset, FlatElevation, GeographicProjection,
    HeightmapParams, NoiseElevation, Sinusoidal, StaticFeatures,
};
use earthgen_voxel::BlockRegistry;

use crate::SettingsError;
use crate::biome::{
    BiomeClassifier, BiomeRegistry, BiomeSurfaceReplacer, ClimateClassifier, SurfaceReplacer,
    UnderwaterReplacer,
};

/// Everything a column computation depends on. Built once, never mutated.
pub struct GeneratorSettings {
    seed: u64,
    projection: Box<dyn GeographicProjection>,
    elevation: Arc<dyn ElevationDataset>,
    features: Arc<dyn FeatureDataset>,
    biomes: Arc<BiomeRegistry>,
    classifier: Box<dyn BiomeClassifier>,
    replacers: Vec<Box<dyn SurfaceReplacer>>,
    blocks: Arc<BlockRegistry>,
    structures: StructureConfig,
}

impl GeneratorSettings {
    /// Starts a builder with the earth biome set, the climate classifier,
    /// the default replacer chain, and no features.
    pub fn builder(
        projection: impl GeographicProjection + 'static,
        elevation: Arc<dyn ElevationDataset>,
    ) -> GeneratorSettingsBuilder {
        GeneratorSettingsBuilder {
            seed: 0,
            projection: Box::new(projection),
            elevation,
            features: Arc::new(StaticFeatures::empty()),
            biomes: None,
            classifier: None,
            replacers: None,
            blocks: None,
            structures: StructureConfig::default(),
        }
    }

    /// Builds settings from the on-disk generator configuration.
    ///
    /// # Errors
    ///
    /// Fails on a non-positive or non-finite projection scale, or if the
    /// features file cannot be read or parsed.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, SettingsError> {
        let elevation: Arc<dyn ElevationDataset> = match &config.elevation {
            ElevationConfig::Flat { height } => Arc::new(FlatElevation::new(*height)),
            ElevationConfig::Noise {
                seed,
                octaves,
                amplitude,
                base_frequency,
                offset,
            } => {
                let params = HeightmapParams {
                    seed: *seed,
                    octaves: *octaves,
                    amplitude: *amplitude,
                    base_frequency: *base_frequency,
                    ..HeightmapParams::default()
                };
                Arc::new(NoiseElevation::new(params, *offset))
            }
        };
        let features: Arc<dyn FeatureDataset> = match &config.features_file {
            Some(path) => Arc::new(StaticFeatures::load(path).map_err(SettingsError::Dataset)?),
            None => Arc::new(StaticFeatures::empty()),
        };

        let builder = match config.projection {
            ProjectionConfig::Equirectangular { blocks_per_degree } => {
                check_scale(blocks_per_degree)?;
                Self::builder(Equirectangular::new(blocks_per_degree), elevation)
            }
            ProjectionConfig::Sinusoidal { blocks_per_degree } => {
                check_scale(blocks_per_degree)?;
                Self::builder(Sinusoidal::new(blocks_per_degree), elevation)
            }
        };
        builder
            .seed(config.seed)
            .features(features)
            .structures(config.structures.clone())
            .build()
    }

    /// Parses a RON generator options string, as stored alongside a world,
    /// and builds settings from it. An empty string yields the defaults.
    pub fn parse(options: &str) -> Result<Self, SettingsError> {
        let config = if options.trim().is_empty() {
            GeneratorConfig::default()
        } else {
            ron::from_str(options).map_err(SettingsError::Parse)?
        };
        Self::from_config(&config)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn projection(&self) -> &dyn GeographicProjection {
        self.projection.as_ref()
    }

    pub fn elevation(&self) -> &dyn ElevationDataset {
        self.elevation.as_ref()
    }

    pub fn features(&self) -> &dyn FeatureDataset {
        self.features.as_ref()
    }

    pub fn biomes(&self) -> &Arc<BiomeRegistry> {
        &self.biomes
    }

    pub fn classifier(&self) -> &dyn BiomeClassifier {
        self.classifier.as_ref()
    }

    pub fn replacers(&self) -> &[Box<dyn SurfaceReplacer>] {
        &self.replacers
    }

    /// Block names available to structure templates.
    pub fn blocks(&self) -> &Arc<BlockRegistry> {
        &self.blocks
    }

    pub fn structures(&self) -> &StructureConfig {
        &self.structures
    }

    pub fn structure_dir(&self) -> &PathBuf {
        &self.structures.structure_dir
    }
}

impl std::fmt::Debug for GeneratorSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorSettings")
            .field("seed", &self.seed)
            .field("biomes", &self.biomes.len())
            .field("replacers", &self.replacers.len())
            .field("structures", &self.structures)
            .finish_non_exhaustive()
    }
}

fn check_scale(blocks_per_degree: f64) -> Result<(), SettingsError> {
    if blocks_per_degree.is_finite() && blocks_per_degree > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::Projection(format!(
            "blocks_per_degree must be positive, got {blocks_per_degree}"
        )))
    }
}

/// Assembles [`GeneratorSettings`], mostly for hosts and tests that supply
/// their own datasets.
pub struct GeneratorSettingsBuilder {
    seed: u64,
    projection: Box<dyn GeographicProjection>,
    elevation: Arc<dyn ElevationDataset>,
    features: Arc<dyn FeatureDataset>,
    biomes: Option<Arc<BiomeRegistry>>,
    classifier: Option<Box<dyn BiomeClassifier>>,
    replacers: Option<Vec<Box<dyn SurfaceReplacer>>>,
    blocks: Option<Arc<BlockRegistry>>,
    structures: StructureConfig,
}

impl GeneratorSettingsBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn features(mut self, features: Arc<dyn FeatureDataset>) -> Self {
        self.features = features;
        self
    }

    pub fn biomes(mut self, biomes: BiomeRegistry) -> Self {
        self.biomes = Some(Arc::new(biomes));
        self
    }

    pub fn classifier(mut self, classifier: impl BiomeClassifier + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    /// Appends a replacer. The first call replaces the default chain.
    pub fn replacer(mut self, replacer: impl SurfaceReplacer + 'static) -> Self {
        self.replacers
            .get_or_insert_with(Vec::new)
            .push(Box::new(replacer));
        self
    }

    pub fn blocks(mut self, blocks: BlockRegistry) -> Self {
        self.blocks = Some(Arc::new(blocks));
        self
    }

    pub fn structures(mut self, structures: StructureConfig) -> Self {
        self.structures = structures;
        self
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::MissingBiome`] when the default classifier is
    /// used with a registry lacking the earth biomes.
    pub fn build(self) -> Result<GeneratorSettings, SettingsError> {
        let biomes = self
            .biomes
            .unwrap_or_else(|| Arc::new(BiomeRegistry::earth()));
        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => Box::new(ClimateClassifier::new(&biomes)?),
        };
        let replacers = self.replacers.unwrap_or_else(|| {
            vec![
                Box::new(BiomeSurfaceReplacer::new(biomes.clone())) as Box<dyn SurfaceReplacer>,
                Box::new(UnderwaterReplacer::default()),
            ]
        });
        Ok(GeneratorSettings {
            seed: self.seed,
            projection: self.projection,
            elevation: self.elevation,
            features: self.features,
            biomes,
            classifier,
            replacers,
            blocks: self.blocks.unwrap_or_default(),
            structures: self.structures,
        })
    }
}
