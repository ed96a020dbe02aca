//! Error types for settings construction and column generation.

use earthgen_geo::DatasetError;
use earthgen_voxel::ChunkPos;

/// Why a column could not be generated.
///
/// `Clone` because one failed computation is delivered to every caller
/// waiting on that column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// A dataset query failed while building the column.
    #[error("dataset query for column {pos} failed: {source}")]
    Dataset {
        /// The column being built.
        pos: ChunkPos,
        /// The dataset failure.
        #[source]
        source: DatasetError,
    },
    /// The column computation panicked.
    #[error("column {pos} computation panicked: {message}")]
    Panicked {
        /// The column being built.
        pos: ChunkPos,
        /// Panic payload, if it was a string.
        message: String,
    },
    /// The cache's worker pool has shut down.
    #[error("column loader pool is closed")]
    PoolClosed,
    /// A bounded wait elapsed before the column was ready.
    #[error("timed out waiting for column {pos}")]
    Timeout {
        /// The column waited on.
        pos: ChunkPos,
    },
}

/// Invalid generator configuration.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A projection parameter is unusable.
    #[error("invalid projection: {0}")]
    Projection(String),
    /// A dataset could not be opened.
    #[error("failed to open dataset: {0}")]
    Dataset(#[source] DatasetError),
    /// The generator options string is not valid RON.
    #[error("failed to parse generator options: {0}")]
    Parse(#[source] ron::error::SpannedError),
    /// A biome the classifier needs is not registered.
    #[error("biome {0:?} is not registered")]
    MissingBiome(String),
}

/// A structure template that could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    /// Reading the template file failed.
    #[error("failed to read structure {asset:?}: {source}")]
    Io {
        asset: String,
        #[source]
        source: std::io::Error,
    },
    /// The template file is not valid RON.
    #[error("failed to parse structure {asset:?}: {source}")]
    Parse {
        asset: String,
        #[source]
        source: ron::error::SpannedError,
    },
    /// The template names a block the registry does not know.
    #[error("structure {asset:?} uses unknown block {block:?}")]
    UnknownBlock { asset: String, block: String },
}
