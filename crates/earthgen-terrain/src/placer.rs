//! Places structure templates at tagged map features.
//!
//! A feature tagged `amenity = "townhall"` resolves to the asset
//! `amenity/townhall`. Templates are placed with their origin on the block
//! above the ground at the feature and clipped to the cube being generated.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use earthgen_voxel::{BlockRegistry, BlockState, CUBE_SIZE, CubePos, CubeWriter};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::descriptor::{ColumnDescriptor, PlacedFeature};
use crate::structure::Populator;
use crate::{GeneratorSettings, StructureError};

/// A block offset relative to the template origin, and the block to place.
pub type TemplateBlock = ((i32, i32, i32), BlockState);

/// An immutable set of blocks placed relative to an origin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructureTemplate {
    blocks: Vec<TemplateBlock>,
}

#[derive(Deserialize)]
struct RawTemplate {
    blocks: Vec<RawBlock>,
}

#[derive(Deserialize)]
struct RawBlock {
    offset: (i32, i32, i32),
    block: String,
}

impl StructureTemplate {
    pub fn new(blocks: Vec<TemplateBlock>) -> Self {
        Self { blocks }
    }

    /// Parses a RON template, resolving block names through `registry`.
    ///
    /// ```ron
    /// (blocks: [(offset: (0, 0, 0), block: "stone")])
    /// ```
    pub fn parse(asset: &str, source: &str, registry: &BlockRegistry) -> Result<Self, StructureError> {
        let raw: RawTemplate = ron::from_str(source).map_err(|source| StructureError::Parse {
            asset: asset.to_string(),
            source,
        })?;
        let blocks = raw
            .blocks
            .into_iter()
            .map(|b| match registry.lookup(&b.block) {
                Some(state) => Ok((b.offset, state)),
                None => Err(StructureError::UnknownBlock {
                    asset: asset.to_string(),
                    block: b.block,
                }),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[TemplateBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Resolves asset names like `shop/bakery` to templates.
pub trait StructureLibrary: Send + Sync {
    /// `Ok(None)` when no such asset exists.
    fn template(&self, asset: &str) -> Result<Option<Arc<StructureTemplate>>, StructureError>;
}

/// Templates registered in code.
#[derive(Clone, Debug, Default)]
pub struct MemoryStructureLibrary {
    templates: HashMap<String, Arc<StructureTemplate>>,
}

impl MemoryStructureLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: impl Into<String>, template: StructureTemplate) -> &mut Self {
        self.templates.insert(asset.into(), Arc::new(template));
        self
    }
}

impl StructureLibrary for MemoryStructureLibrary {
    fn template(&self, asset: &str) -> Result<Option<Arc<StructureTemplate>>, StructureError> {
        Ok(self.templates.get(asset).cloned())
    }
}

/// Templates read lazily from `<root>/<key>/<value>.ron` and memoised,
/// misses included.
pub struct DirectoryStructureLibrary {
    root: PathBuf,
    registry: Arc<BlockRegistry>,
    loaded: DashMap<String, Option<Arc<StructureTemplate>>>,
}

impl DirectoryStructureLibrary {
    pub fn new(root: impl Into<PathBuf>, registry: Arc<BlockRegistry>) -> Self {
        Self {
            root: root.into(),
            registry,
            loaded: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, asset: &str) -> Option<PathBuf> {
        let (key, value) = asset.split_once('/')?;
        let safe = |part: &str| {
            !part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\'])
        };
        (safe(key) && safe(value)).then(|| self.root.join(key).join(format!("{value}.ron")))
    }

    fn read(&self, asset: &str) -> Result<Option<Arc<StructureTemplate>>, StructureError> {
        let Some(path) = self.path_for(asset) else {
            return Ok(None);
        };
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StructureError::Io {
                    asset: asset.to_string(),
                    source,
                });
            }
        };
        let template = StructureTemplate::parse(asset, &source, &self.registry)?;
        debug!(asset, blocks = template.len(), path = %path.display(), "loaded structure template");
        Ok(Some(Arc::new(template)))
    }
}

impl StructureLibrary for DirectoryStructureLibrary {
    fn template(&self, asset: &str) -> Result<Option<Arc<StructureTemplate>>, StructureError> {
        if let Some(known) = self.loaded.get(asset) {
            return Ok(known.clone());
        }
        let template = self.read(asset)?;
        if template.is_none() {
            warn!(asset, root = %self.root.display(), "structure asset not found");
        }
        self.loaded.insert(asset.to_string(), template.clone());
        Ok(template)
    }
}

/// The tag-driven structure populator.
pub struct StructurePlacer {
    library: Arc<dyn StructureLibrary>,
    placeable: Vec<String>,
}

impl StructurePlacer {
    pub fn new(library: Arc<dyn StructureLibrary>, placeable: Vec<String>) -> Self {
        Self { library, placeable }
    }

    pub fn placeable_tags(&self) -> &[String] {
        &self.placeable
    }

    fn place(
        &self,
        cube: CubePos,
        target: &mut dyn CubeWriter,
        column: &ColumnDescriptor,
        feature: &PlacedFeature,
        template: &StructureTemplate,
    ) {
        // Widened so templates near the world's height limits cannot overflow.
        let origin_y = i64::from(column.ground_height(feature.x, feature.z)) + 1;
        let (bx, by, bz) = cube.min_block();
        let local = |origin: i64, offset: i32, min: i32| {
            let l = origin + i64::from(offset) - i64::from(min);
            usize::try_from(l).ok().filter(|&l| l < CUBE_SIZE)
        };
        for &((dx, dy, dz), state) in template.blocks() {
            if let (Some(lx), Some(ly), Some(lz)) = (
                local(i64::from(feature.x), dx, bx),
                local(origin_y, dy, by),
                local(i64::from(feature.z), dz, bz),
            ) {
                target.set_block(lx, ly, lz, state);
            }
        }
    }
}

impl Populator for StructurePlacer {
    fn name(&self) -> &str {
        "structures"
    }

    fn populate(
        &self,
        cube: CubePos,
        target: &mut dyn CubeWriter,
        column: &ColumnDescriptor,
        _settings: &GeneratorSettings,
    ) {
        for feature in column.features() {
            for (key, value) in &feature.tags {
                if !self.placeable.iter().any(|k| k == key) {
                    continue;
                }
                let asset = format!("{key}/{value}");
                match self.library.template(&asset) {
                    Ok(Some(template)) => self.place(cube, target, column, feature, &template),
                    Ok(None) => debug!(%cube, asset = %asset, "no structure for feature"),
                    Err(err) => warn!(%cube, error = %err, "skipping structure"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use earthgen_geo::FlatElevation;
    use earthgen_voxel::CubePrimer;

    use crate::descriptor::ColumnDescriptorBuilder;
    use crate::test_support::flat_settings;

    fn tower() -> StructureTemplate {
        StructureTemplate::new((0..20).map(|dy| ((0, dy, 0), BlockState::STONE)).collect())
    }

    fn column_with(tags: &[(&str, &str)]) -> ColumnDescriptor {
        column_at(5, tags)
    }

    fn column_at(ground: i32, tags: &[(&str, &str)]) -> ColumnDescriptor {
        let mut b = ColumnDescriptorBuilder::new();
        for z in 0..16 {
            for x in 0..16 {
                b.set_ground(x, z, ground);
            }
        }
        b.push_feature(PlacedFeature {
            x: 3,
            z: 4,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        });
        b.build()
    }

    fn default_tags() -> Vec<String> {
        ["amenity", "leisure", "tourism", "shop"].map(String::from).to_vec()
    }

    #[test]
    fn test_places_template_on_ground_clipped() {
        let mut library = MemoryStructureLibrary::new();
        library.insert("amenity/townhall", tower());
        let placer = StructurePlacer::new(Arc::new(library), default_tags());
        let settings = flat_settings(Arc::new(FlatElevation::new(5.0)));
        let column = column_with(&[("amenity", "townhall")]);

        let mut lower = CubePrimer::empty();
        placer.populate(CubePos::new(0, 0, 0), &mut lower, &column, &settings);
        assert_eq!(lower.block(3, 5, 4), BlockState::AIR, "ground itself is untouched");
        assert_eq!(lower.block(3, 6, 4), BlockState::STONE);
        assert_eq!(lower.count(BlockState::STONE), 10, "y 6..16 fall in this cube");

        let mut upper = CubePrimer::empty();
        placer.populate(CubePos::new(0, 1, 0), &mut upper, &column, &settings);
        assert_eq!(upper.count(BlockState::STONE), 10, "the rest lands in the cube above");
    }

    #[test]
    fn test_places_near_height_limit() {
        let mut library = MemoryStructureLibrary::new();
        library.insert("amenity/townhall", tower());
        library.insert(
            "leisure/park",
            StructureTemplate::new(vec![((i32::MAX, i32::MIN, i32::MAX), BlockState::SAND)]),
        );
        let placer = StructurePlacer::new(Arc::new(library), default_tags());
        let settings = flat_settings(Arc::new(FlatElevation::new(5.0)));
        let top = CubePos::new(0, i32::MAX >> 4, 0);

        let mut primer = CubePrimer::empty();
        let column = column_at(i32::MAX - 1, &[("amenity", "townhall"), ("leisure", "park")]);
        placer.populate(top, &mut primer, &column, &settings);
        assert_eq!(primer.block(3, 15, 4), BlockState::STONE, "origin lands on the top block");
        assert_eq!(primer.count(BlockState::STONE), 1, "the rest is above the world");
        assert_eq!(primer.count(BlockState::SAND), 0);

        let mut primer = CubePrimer::empty();
        placer.populate(top, &mut primer, &column_at(i32::MAX, &[("amenity", "townhall")]), &settings);
        assert!(primer.is_empty(), "ground at the limit leaves no room above it");
    }

    #[test]
    fn test_missing_asset_and_unlisted_tags_skip() {
        let placer = StructurePlacer::new(Arc::new(MemoryStructureLibrary::new()), default_tags());
        let settings = flat_settings(Arc::new(FlatElevation::new(5.0)));
        let column = column_with(&[("shop", "nowhere"), ("name", "Main St")]);
        let mut primer = CubePrimer::empty();
        placer.populate(CubePos::new(0, 0, 0), &mut primer, &column, &settings);
        assert!(primer.is_empty());
    }

    #[test]
    fn test_directory_library_loads_and_memoises() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("shop")).unwrap();
        std::fs::write(
            dir.path().join("shop/bakery.ron"),
            "(blocks: [(offset: (0, 0, 0), block: \"sand\"), (offset: (1, 0, 0), block: \"stone\")])",
        )
        .unwrap();
        let library = DirectoryStructureLibrary::new(dir.path(), Arc::new(BlockRegistry::new()));

        let template = library.template("shop/bakery").unwrap().unwrap();
        assert_eq!(template.blocks(), &[((0, 0, 0), BlockState::SAND), ((1, 0, 0), BlockState::STONE)]);
        std::fs::remove_file(dir.path().join("shop/bakery.ron")).unwrap();
        assert!(library.template("shop/bakery").unwrap().is_some(), "served from memo");
        assert!(library.template("shop/florist").unwrap().is_none());
    }

    #[test]
    fn test_directory_library_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let library = DirectoryStructureLibrary::new(dir.path(), Arc::new(BlockRegistry::new()));
        assert!(library.template("shop/../../etc").unwrap().is_none());
        assert!(library.template("amenity/..").unwrap().is_none());
        assert!(library.template("noslash").unwrap().is_none());
    }

    #[test]
    fn test_unknown_block_is_an_error() {
        let err = StructureTemplate::parse(
            "leisure/park",
            "(blocks: [(offset: (0, 0, 0), block: \"unobtainium\")])",
            &BlockRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StructureError::UnknownBlock { ref block, .. } if block == "unobtainium"));
    }
}
