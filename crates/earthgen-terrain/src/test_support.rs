//! Instrumented datasets and loaders shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use earthgen_geo::{DatasetError, ElevationDataset, Equirectangular, GeoPoint};
use earthgen_voxel::{CUBE_SIZE, ChunkPos};

use crate::descriptor::{ColumnDescriptor, ColumnDescriptorBuilder};
use crate::loader::ColumnLoader;
use crate::{GenerationError, GeneratorSettings};

/// Settings at 1000 blocks per degree over the given elevation source.
pub(crate) fn flat_settings(elevation: Arc<dyn ElevationDataset>) -> Arc<GeneratorSettings> {
    Arc::new(
        GeneratorSettings::builder(Equirectangular::new(1000.0), elevation)
            .build()
            .unwrap(),
    )
}

/// Constant elevation that records how it was queried.
pub(crate) struct CountingElevation {
    height: f64,
    calls: AtomicUsize,
    points: AtomicUsize,
}

impl CountingElevation {
    pub(crate) fn new(height: f64) -> Self {
        Self {
            height,
            calls: AtomicUsize::new(0),
            points: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn points(&self) -> usize {
        self.points.load(Ordering::SeqCst)
    }
}

impl ElevationDataset for CountingElevation {
    fn elevations(&self, points: &[GeoPoint]) -> Result<Vec<f64>, DatasetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.points.fetch_add(points.len(), Ordering::SeqCst);
        Ok(vec![self.height; points.len()])
    }
}

/// Fails a fixed number of times, then answers a constant.
pub(crate) struct FailingElevation {
    remaining: AtomicUsize,
    height: f64,
}

impl FailingElevation {
    pub(crate) fn always() -> Self {
        Self::times(usize::MAX, 0.0)
    }

    pub(crate) fn times(failures: usize, height: f64) -> Self {
        Self {
            remaining: AtomicUsize::new(failures),
            height,
        }
    }
}

impl ElevationDataset for FailingElevation {
    fn elevations(&self, points: &[GeoPoint]) -> Result<Vec<f64>, DatasetError> {
        let failed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(DatasetError::Unavailable("tile server offline".into()))
        } else {
            Ok(vec![self.height; points.len()])
        }
    }
}

/// A flat column at `height` everywhere, null island included.
pub(crate) fn flat_column(height: i32) -> ColumnDescriptor {
    let mut builder = ColumnDescriptorBuilder::new();
    for z in 0..CUBE_SIZE as i32 {
        for x in 0..CUBE_SIZE as i32 {
            builder.set_ground(x, z, height).set_water(x, z, height);
        }
    }
    builder.build()
}

/// Counts loads, optionally failing or panicking first.
pub(crate) struct CountingLoader {
    height: i32,
    loads: AtomicUsize,
    failures_left: AtomicUsize,
    panics: bool,
}

impl CountingLoader {
    pub(crate) fn flat(height: f64) -> Self {
        Self {
            height: height.floor() as i32,
            loads: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            panics: false,
        }
    }

    pub(crate) fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::flat(0.0)
        }
    }

    pub(crate) fn failing_first(self, failures: usize) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ColumnLoader for CountingLoader {
    fn load(&self, pos: ChunkPos) -> Result<ColumnDescriptor, GenerationError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.panics {
            panic!("boom at {pos}");
        }
        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(GenerationError::Dataset {
                pos,
                source: DatasetError::Unavailable("injected fault".into()),
            });
        }
        Ok(flat_column(self.height))
    }
}

#[derive(Default)]
struct Gate {
    started: bool,
    open: bool,
}

/// Blocks every load until [`GatedLoader::release`] is called.
pub(crate) struct GatedLoader {
    loads: AtomicUsize,
    gate: Mutex<Gate>,
    changed: Condvar,
}

impl GatedLoader {
    pub(crate) fn new() -> Self {
        Self {
            loads: AtomicUsize::new(0),
            gate: Mutex::new(Gate::default()),
            changed: Condvar::new(),
        }
    }

    pub(crate) fn wait_for_start(&self) {
        let mut gate = self.gate.lock().unwrap();
        while !gate.started {
            gate = self.changed.wait(gate).unwrap();
        }
    }

    pub(crate) fn release(&self) {
        self.gate.lock().unwrap().open = true;
        self.changed.notify_all();
    }

    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ColumnLoader for GatedLoader {
    fn load(&self, _pos: ChunkPos) -> Result<ColumnDescriptor, GenerationError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.gate.lock().unwrap();
        gate.started = true;
        self.changed.notify_all();
        while !gate.open {
            gate = self.changed.wait(gate).unwrap();
        }
        Ok(flat_column(64))
    }
}
