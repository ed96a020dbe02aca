//! Block states and the name ↔ id registry.
//!
//! Terrain only ever emits the built-in states below. The registry exists so
//! that structure templates, which name blocks as strings, can be resolved to
//! compact ids once at load time. Air is always id 0.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Compact identifier for a block state (2 bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockState(pub u16);

impl BlockState {
    /// Empty space.
    pub const AIR: Self = Self(0);
    /// Default solid fill below the filler layers.
    pub const STONE: Self = Self(1);
    /// Filler under grass.
    pub const DIRT: Self = Self(2);
    /// Temperate surface.
    pub const GRASS: Self = Self(3);
    /// Beach and desert surface.
    pub const SAND: Self = Self(4);
    /// Sea floor surface.
    pub const GRAVEL: Self = Self(5);
    /// Cold surface.
    pub const SNOW: Self = Self(6);
    /// Water fill between ground and water level.
    pub const WATER: Self = Self(7);
    /// Frozen water surface.
    pub const ICE: Self = Self(8);

    /// Returns `true` for air.
    pub fn is_air(self) -> bool {
        self == Self::AIR
    }
}

const BUILTIN_NAMES: [(&str, BlockState); 9] = [
    ("air", BlockState::AIR),
    ("stone", BlockState::STONE),
    ("dirt", BlockState::DIRT),
    ("grass", BlockState::GRASS),
    ("sand", BlockState::SAND),
    ("gravel", BlockState::GRAVEL),
    ("snow", BlockState::SNOW),
    ("water", BlockState::WATER),
    ("ice", BlockState::ICE),
];

/// Errors that can occur during block registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A block with the same name has already been registered.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// All 65 536 ids have been consumed.
    #[error("block registry is full (max 65536 states)")]
    RegistryFull,
}

/// Maps block names to [`BlockState`] ids and back.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    names: Vec<String>,
    name_to_id: FxHashMap<String, BlockState>,
}

impl BlockRegistry {
    /// Creates a registry with the built-in states pre-registered.
    pub fn new() -> Self {
        let mut registry = Self {
            names: Vec::with_capacity(BUILTIN_NAMES.len()),
            name_to_id: FxHashMap::default(),
        };
        for (name, state) in BUILTIN_NAMES {
            debug_assert_eq!(state.0 as usize, registry.names.len());
            registry.names.push(name.to_string());
            registry.name_to_id.insert(name.to_string(), state);
        }
        registry
    }

    /// Registers a new block name and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name exists, or
    /// [`RegistryError::RegistryFull`] if every id is taken.
    pub fn register(&mut self, name: &str) -> Result<BlockState, RegistryError> {
        if self.name_to_id.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        if self.names.len() > u16::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }
        let id = BlockState(self.names.len() as u16);
        self.names.push(name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// Looks up a block by name.
    pub fn lookup(&self, name: &str) -> Option<BlockState> {
        self.name_to_id.get(name).copied()
    }

    /// Returns the name of a block, if registered.
    pub fn name(&self, state: BlockState) -> Option<&str> {
        self.names.get(state.0 as usize).map(String::as_str)
    }

    /// Number of registered states, built-ins included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false`: air is registered from construction.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
