//! Concurrent column cache with request coalescing and a background
//! loader pool.
//!
//! Two structures cooperate: a single-flight map of computations still
//! running, and an expiring store of finished descriptors. A request first
//! checks the store, then joins or starts a flight. Workers publish a
//! successful result to the store before retiring the flight, so a key is
//! always findable in at least one of the two while it is being resolved.
//! Failures are delivered to the flight's waiters and never stored.

mod flight;
mod store;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use earthgen_config::CacheConfig;
use earthgen_voxel::ChunkPos;
use tracing::{debug, error, warn};

use self::flight::Flight;
use self::store::{ExpiringStore, StoreLimits};
use crate::GenerationError;
use crate::descriptor::ColumnDescriptor;
use crate::loader::ColumnLoader;

/// Outcome of one column computation.
pub type ColumnResult = Result<Arc<ColumnDescriptor>, GenerationError>;

/// Cache sizing and pool options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheOptions {
    /// Completed columns untouched for this long are dropped.
    pub idle_timeout: Duration,
    pub max_entries: usize,
    pub max_bytes: usize,
    /// Loader threads; 0 picks a count from the CPU count.
    pub worker_threads: usize,
}

impl CacheOptions {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            max_entries: config.max_entries,
            max_bytes: config.max_bytes,
            worker_threads: config.worker_threads,
        }
    }

    fn thread_count(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            let cpus = num_cpus::get().max(2);
            (cpus - 2).max(1)
        }
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// Point-in-time cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from the store.
    pub hits: u64,
    /// Requests that started a new computation.
    pub misses: u64,
    /// Requests that joined a computation already running.
    pub coalesced: u64,
    /// Loader invocations that finished, successfully or not.
    pub loads: u64,
    pub failures: u64,
    pub evictions: u64,
    pub entries: usize,
    pub bytes: usize,
    pub in_flight: usize,
}

/// A request for one column. Either already resolved or tied to a running
/// computation; in both cases it resolves exactly once.
#[derive(Clone)]
pub struct ColumnHandle {
    pos: ChunkPos,
    state: HandleState,
}

#[derive(Clone)]
enum HandleState {
    Ready(Arc<ColumnDescriptor>),
    Pending(Arc<Flight<ColumnResult>>),
}

impl ColumnHandle {
    fn ready(pos: ChunkPos, value: Arc<ColumnDescriptor>) -> Self {
        Self {
            pos,
            state: HandleState::Ready(value),
        }
    }

    fn pending(pos: ChunkPos, flight: Arc<Flight<ColumnResult>>) -> Self {
        Self {
            pos,
            state: HandleState::Pending(flight),
        }
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        match &self.state {
            HandleState::Ready(_) => true,
            HandleState::Pending(flight) => flight.peek().is_some(),
        }
    }

    /// The result if already available, without blocking.
    pub fn try_get(&self) -> Option<ColumnResult> {
        match &self.state {
            HandleState::Ready(value) => Some(Ok(value.clone())),
            HandleState::Pending(flight) => flight.peek(),
        }
    }

    /// Blocks until the column is resolved.
    pub fn join(&self) -> ColumnResult {
        match &self.state {
            HandleState::Ready(value) => Ok(value.clone()),
            HandleState::Pending(flight) => flight.wait(),
        }
    }

    /// Like [`Self::join`], giving up with [`GenerationError::Timeout`]
    /// after `timeout`. The computation keeps running.
    pub fn join_timeout(&self, timeout: Duration) -> ColumnResult {
        match &self.state {
            HandleState::Ready(value) => Ok(value.clone()),
            HandleState::Pending(flight) => flight
                .wait_timeout(timeout)
                .unwrap_or(Err(GenerationError::Timeout { pos: self.pos })),
        }
    }
}

impl std::fmt::Debug for ColumnHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnHandle")
            .field("pos", &self.pos)
            .field("done", &self.is_done())
            .finish()
    }
}

struct LoadJob {
    pos: ChunkPos,
    flight: Arc<Flight<ColumnResult>>,
}

struct Shared {
    loader: Arc<dyn ColumnLoader>,
    store: ExpiringStore<ChunkPos, ColumnDescriptor>,
    inflight: DashMap<ChunkPos, Arc<Flight<ColumnResult>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    loads: AtomicU64,
    failures: AtomicU64,
}

/// The shared column cache. Owns the loader pool; dropping the cache lets
/// queued computations finish and joins the workers.
pub struct ChunkDataCache {
    shared: Arc<Shared>,
    job_sender: Option<Sender<LoadJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl ChunkDataCache {
    /// Starts the loader pool.
    pub fn new(loader: Arc<dyn ColumnLoader>, options: CacheOptions) -> Self {
        let shared = Arc::new(Shared {
            loader,
            store: ExpiringStore::new(StoreLimits {
                idle_timeout: options.idle_timeout,
                max_entries: options.max_entries,
                max_bytes: options.max_bytes,
            }),
            inflight: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        });

        let (job_sender, job_receiver) = unbounded::<LoadJob>();
        let mut workers = Vec::new();
        for index in 0..options.thread_count() {
            let receiver = job_receiver.clone();
            let shared = Arc::clone(&shared);
            match std::thread::Builder::new()
                .name(format!("column-loader-{index}"))
                .spawn(move || worker_loop(&shared, &receiver))
            {
                Ok(handle) => workers.push(handle),
                Err(err) => error!(index, error = %err, "failed to spawn column loader thread"),
            }
        }
        debug!(workers = workers.len(), "column cache started");

        Self {
            shared,
            job_sender: Some(job_sender),
            workers,
        }
    }

    /// Requests a column without blocking.
    pub fn get(&self, pos: ChunkPos) -> ColumnHandle {
        let shared = &self.shared;
        if let Some(value) = shared.store.get(&pos) {
            shared.hits.fetch_add(1, Ordering::Relaxed);
            return ColumnHandle::ready(pos, value);
        }

        let flight = match shared.inflight.entry(pos) {
            Entry::Occupied(running) => {
                shared.coalesced.fetch_add(1, Ordering::Relaxed);
                return ColumnHandle::pending(pos, running.get().clone());
            }
            Entry::Vacant(slot) => {
                // A worker may have published between the store check and
                // taking this shard.
                if let Some(value) = shared.store.get(&pos) {
                    shared.hits.fetch_add(1, Ordering::Relaxed);
                    return ColumnHandle::ready(pos, value);
                }
                let flight = Arc::new(Flight::new());
                slot.insert(flight.clone());
                flight
            }
        };
        shared.misses.fetch_add(1, Ordering::Relaxed);

        let job = LoadJob {
            pos,
            flight: flight.clone(),
        };
        let sent = match &self.job_sender {
            Some(sender) => sender.send(job).is_ok(),
            None => false,
        };
        if !sent {
            warn!(%pos, "column loader pool is closed");
            shared.retire(pos, &flight);
            flight.complete(Err(GenerationError::PoolClosed));
        }
        ColumnHandle::pending(pos, flight)
    }

    /// Requests a column and waits for it.
    pub fn get_blocking(&self, pos: ChunkPos) -> ColumnResult {
        self.get(pos).join()
    }

    /// True if a finished descriptor for `pos` is in the store. Does not
    /// count as an access for idle expiry.
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.shared.store.contains(&pos)
    }

    /// Drops every completed entry idle past the timeout.
    pub fn evict_expired(&self) -> usize {
        self.shared.store.evict_expired()
    }

    /// Releases unreferenced columns, least recently used first, until at
    /// most `target_bytes` remain. For host memory-pressure signals.
    pub fn trim(&self, target_bytes: usize) -> usize {
        let reclaimed = self.shared.store.trim(target_bytes);
        debug!(reclaimed, target_bytes, "trimmed column cache");
        reclaimed
    }

    /// Drops all completed entries. Running computations are unaffected.
    pub fn clear(&self) {
        self.shared.store.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let s = &self.shared;
        CacheStats {
            hits: s.hits.load(Ordering::Relaxed),
            misses: s.misses.load(Ordering::Relaxed),
            coalesced: s.coalesced.load(Ordering::Relaxed),
            loads: s.loads.load(Ordering::Relaxed),
            failures: s.failures.load(Ordering::Relaxed),
            evictions: s.store.evictions(),
            entries: s.store.len(),
            bytes: s.store.total_bytes(),
            in_flight: s.inflight.len(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for ChunkDataCache {
    fn drop(&mut self) {
        self.job_sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("column loader thread panicked");
            }
        }
    }
}

impl Shared {
    /// Removes the in-flight record only if it is still this flight.
    fn retire(&self, pos: ChunkPos, flight: &Arc<Flight<ColumnResult>>) {
        self.inflight
            .remove_if(&pos, |_, current| Arc::ptr_eq(current, flight));
    }
}

fn worker_loop(shared: &Shared, receiver: &Receiver<LoadJob>) {
    while let Ok(LoadJob { pos, flight }) = receiver.recv() {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| shared.loader.load(pos)))
            .unwrap_or_else(|payload| {
                Err(GenerationError::Panicked {
                    pos,
                    message: panic_message(payload.as_ref()),
                })
            });
        shared.loads.fetch_add(1, Ordering::Relaxed);

        let result = match outcome {
            Ok(descriptor) => {
                let bytes = descriptor.approx_bytes();
                let descriptor = Arc::new(descriptor);
                shared.store.insert(pos, descriptor.clone(), bytes);
                debug!(
                    %pos,
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "column ready"
                );
                Ok(descriptor)
            }
            Err(err) => {
                shared.failures.fetch_add(1, Ordering::Relaxed);
                warn!(%pos, error = %err, "column computation failed");
                Err(err)
            }
        };
        shared.retire(pos, &flight);
        flight.complete(result);
        drop(flight);

        let expired = shared.store.maybe_sweep();
        if expired > 0 {
            debug!(expired, "evicted idle columns");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
