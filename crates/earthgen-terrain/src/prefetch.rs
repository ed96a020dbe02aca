//! Host notifications that a column or cube is about to be needed.
//!
//! Prefetching starts the column computation on the cache's pool so the
//! later blocking request finds it done or in progress. Errors never reach
//! the host: they are logged and dropped.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use earthgen_voxel::{ChunkPos, CubePos};
use tracing::error;

use crate::cache::ChunkDataCache;

#[derive(Clone)]
pub struct PrefetchHook {
    cache: Arc<ChunkDataCache>,
}

impl PrefetchHook {
    pub fn new(cache: Arc<ChunkDataCache>) -> Self {
        Self { cache }
    }

    pub fn on_column_loading(&self, pos: ChunkPos) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.cache.get(pos).try_get())) {
            Ok(Some(Err(err))) => {
                error!(%pos, error = %err, "async exception while prefetching column data");
            }
            Ok(_) => {}
            Err(_) => error!(%pos, "panic while prefetching column data"),
        }
    }

    pub fn on_cube_loading(&self, cube: CubePos) {
        self.on_column_loading(cube.chunk_pos());
    }
}

impl std::fmt::Debug for PrefetchHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchHook").finish_non_exhaustive()
    }
}
