//! Completed values with idle expiry and a memory budget.
//!
//! Memory-pressure reclamation only drops values nobody else holds, so a
//! caller keeping an `Arc` never sees its value recomputed underneath it.

use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

struct StoreEntry<V> {
    value: Arc<V>,
    bytes: usize,
    /// Nanoseconds since the store's epoch.
    last_access: AtomicU64,
}

/// Saturates durations too long to count in `u64` nanoseconds.
fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl<V> StoreEntry<V> {
    fn idle_since(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }

    fn unreferenced(&self) -> bool {
        Arc::strong_count(&self.value) == 1
    }
}

/// Limits applied to an [`ExpiringStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StoreLimits {
    pub idle_timeout: Duration,
    pub max_entries: usize,
    pub max_bytes: usize,
}

pub(crate) struct ExpiringStore<K, V> {
    entries: DashMap<K, StoreEntry<V>>,
    limits: StoreLimits,
    epoch: Instant,
    total_bytes: AtomicUsize,
    evictions: AtomicU64,
    last_sweep: AtomicU64,
}

impl<K, V> ExpiringStore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(limits: StoreLimits) -> Self {
        Self {
            entries: DashMap::new(),
            limits,
            epoch: Instant::now(),
            total_bytes: AtomicUsize::new(0),
            evictions: AtomicU64::new(0),
            last_sweep: AtomicU64::new(0),
        }
    }

    fn now(&self) -> u64 {
        nanos(self.epoch.elapsed())
    }

    fn expired(&self, entry: &StoreEntry<V>, now: u64) -> bool {
        now.saturating_sub(entry.idle_since()) >= nanos(self.limits.idle_timeout)
    }

    fn account_removed(&self, entry: &StoreEntry<V>) {
        self.total_bytes.fetch_sub(entry.bytes, Ordering::Relaxed);
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the value and refreshes its idle timer. Expired values are
    /// dropped on sight and reported as absent.
    pub(crate) fn get(&self, key: &K) -> Option<Arc<V>> {
        let now = self.now();
        {
            let entry = self.entries.get(key)?;
            if !self.expired(&entry, now) {
                entry.last_access.store(now, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
        }
        if let Some((_, removed)) = self.entries.remove_if(key, |_, e| self.expired(e, now)) {
            self.account_removed(&removed);
        }
        None
    }

    /// Whether a live value is stored, without refreshing its idle timer.
    pub(crate) fn contains(&self, key: &K) -> bool {
        let now = self.now();
        self.entries.get(key).is_some_and(|entry| !self.expired(&entry, now))
    }

    /// Stores a value, then enforces the entry and byte budgets.
    pub(crate) fn insert(&self, key: K, value: Arc<V>, bytes: usize) {
        let entry = StoreEntry {
            value,
            bytes,
            last_access: AtomicU64::new(self.now()),
        };
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);
        if let Some(old) = self.entries.insert(key, entry) {
            self.total_bytes.fetch_sub(old.bytes, Ordering::Relaxed);
        }
        if self.entries.len() > self.limits.max_entries || self.total_bytes() > self.limits.max_bytes {
            self.reclaim(self.limits.max_entries, self.limits.max_bytes);
        }
    }

    /// Drops every entry idle for longer than the timeout.
    pub(crate) fn evict_expired(&self) -> usize {
        let now = self.now();
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            if self.expired(entry, now) {
                self.account_removed(entry);
                evicted += 1;
                false
            } else {
                true
            }
        });
        self.last_sweep.store(now, Ordering::Relaxed);
        evicted
    }

    /// Runs [`Self::evict_expired`] at most once per quarter idle window.
    pub(crate) fn maybe_sweep(&self) -> usize {
        let now = self.now();
        let last = self.last_sweep.load(Ordering::Relaxed);
        let interval = nanos(self.limits.idle_timeout / 4);
        if now.saturating_sub(last) < interval {
            return 0;
        }
        if self
            .last_sweep
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return 0;
        }
        self.evict_expired()
    }

    /// Reclaims unreferenced values, least recently used first, until the
    /// store holds at most `target_bytes`. Returns the number reclaimed.
    pub(crate) fn trim(&self, target_bytes: usize) -> usize {
        self.reclaim(usize::MAX, target_bytes)
    }

    fn reclaim(&self, max_entries: usize, max_bytes: usize) -> usize {
        let mut candidates: Vec<(u64, K)> = self
            .entries
            .iter()
            .filter(|e| e.unreferenced())
            .map(|e| (e.idle_since(), e.key().clone()))
            .collect();
        candidates.sort_unstable_by_key(|(last_access, _)| *last_access);

        let mut reclaimed = 0;
        for (_, key) in candidates {
            if self.entries.len() <= max_entries && self.total_bytes() <= max_bytes {
                break;
            }
            if let Some((_, removed)) = self.entries.remove_if(&key, |_, e| e.unreferenced()) {
                self.account_removed(&removed);
                reclaimed += 1;
            }
        }
        reclaimed
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn total_bytes(&self) -> usize {
        self.total_bytes.load(Ordering::Relaxed)
    }

    pub(crate) fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Drops every entry. Inserts racing with this keep their bytes counted.
    pub(crate) fn clear(&self) {
        self.entries.retain(|_, entry| {
            self.account_removed(entry);
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn limits(idle_ms: u64, max_entries: usize, max_bytes: usize) -> StoreLimits {
        StoreLimits {
            idle_timeout: Duration::from_millis(idle_ms),
            max_entries,
            max_bytes,
        }
    }

    #[test]
    fn test_get_after_insert() {
        let store = ExpiringStore::new(limits(10_000, 16, 1 << 20));
        store.insert(1u32, Arc::new("a"), 10);
        assert_eq!(store.get(&1).as_deref(), Some(&"a"));
        assert_eq!(store.get(&2), None);
        assert_eq!(store.total_bytes(), 10);
    }

    #[test]
    fn test_idle_entries_expire() {
        let store = ExpiringStore::new(limits(20, 16, 1 << 20));
        store.insert(1u32, Arc::new(1u8), 1);
        store.insert(2u32, Arc::new(2u8), 1);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(store.get(&1), None, "idle entry should expire on access");
        assert_eq!(store.evict_expired(), 1, "sweep removes the other one");
        assert_eq!(store.len(), 0);
        assert_eq!(store.total_bytes(), 0);
        assert_eq!(store.evictions(), 2);
    }

    #[test]
    fn test_entry_budget_evicts_least_recent() {
        let store = ExpiringStore::new(limits(60_000, 2, usize::MAX));
        store.insert(1u32, Arc::new(1u8), 1);
        thread::sleep(Duration::from_millis(2));
        store.insert(2u32, Arc::new(2u8), 1);
        thread::sleep(Duration::from_millis(2));
        let _ = store.get(&1);
        thread::sleep(Duration::from_millis(2));
        store.insert(3u32, Arc::new(3u8), 1);
        assert_eq!(store.len(), 2);
        assert!(store.get(&2).is_none(), "least recently used entry should go first");
        assert!(store.get(&1).is_some());
    }

    #[test]
    fn test_referenced_values_survive_pressure() {
        let store = ExpiringStore::new(limits(60_000, 16, usize::MAX));
        let held = Arc::new(1u8);
        store.insert(1u32, held.clone(), 1);
        store.insert(2u32, Arc::new(2u8), 1);
        assert_eq!(store.trim(0), 1, "only the unreferenced entry is trimmable");
        assert!(store.get(&1).is_some(), "externally held value must not be reclaimed");
        assert!(store.get(&2).is_none());
        drop(held);
        assert_eq!(store.trim(0), 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_byte_budget() {
        let store = ExpiringStore::new(limits(60_000, 16, 100));
        store.insert(1u32, Arc::new(1u8), 60);
        thread::sleep(Duration::from_millis(2));
        store.insert(2u32, Arc::new(2u8), 60);
        assert_eq!(store.len(), 1, "byte budget allows one entry");
        assert!(store.get(&2).is_some());
        assert_eq!(store.total_bytes(), 60);
    }

    #[test]
    fn test_replace_keeps_byte_count() {
        let store = ExpiringStore::new(limits(60_000, 16, usize::MAX));
        store.insert(1u32, Arc::new(1u8), 100);
        store.insert(1u32, Arc::new(2u8), 40);
        assert_eq!(store.total_bytes(), 40);
        store.clear();
        assert_eq!(store.len(), 0);
        assert_eq!(store.total_bytes(), 0);
    }

    #[test]
    fn test_clear_racing_inserts_keeps_byte_count() {
        let store = Arc::new(ExpiringStore::new(limits(60_000, usize::MAX, usize::MAX)));
        let writers: Vec<_> = (0..4u32)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..2_000u32 {
                        store.insert(t * 10_000 + i % 64, Arc::new(i), 1 + (i % 7) as usize);
                    }
                })
            })
            .collect();
        for _ in 0..200 {
            store.clear();
            thread::yield_now();
        }
        for w in writers {
            w.join().unwrap();
        }
        let held: usize = store.entries.iter().map(|e| e.bytes).sum();
        assert_eq!(store.total_bytes(), held, "byte count must match surviving entries");

        let before = store.evictions();
        let remaining = store.len() as u64;
        store.clear();
        assert_eq!(store.total_bytes(), 0);
        assert_eq!(store.evictions(), before + remaining, "cleared entries count as evictions");
    }

    #[test]
    fn test_contains_does_not_refresh_idle_timer() {
        let store = ExpiringStore::new(limits(60, 16, usize::MAX));
        store.insert(1u32, Arc::new(1u8), 1);
        thread::sleep(Duration::from_millis(40));
        assert!(store.contains(&1));
        assert!(!store.contains(&2));
        thread::sleep(Duration::from_millis(40));
        assert!(!store.contains(&1), "checking presence must not keep an entry alive");
        assert_eq!(store.evict_expired(), 1);
    }

    #[test]
    fn test_unbounded_idle_timeout_never_expires() {
        let store = ExpiringStore::new(StoreLimits {
            idle_timeout: Duration::MAX,
            max_entries: 16,
            max_bytes: usize::MAX,
        });
        store.insert(1u32, Arc::new(1u8), 1);
        thread::sleep(Duration::from_millis(5));
        assert_eq!(store.evict_expired(), 0, "an effectively infinite timeout keeps entries");
        assert_eq!(store.maybe_sweep(), 0);
        assert!(store.contains(&1));
        assert!(store.get(&1).is_some());
    }
}
