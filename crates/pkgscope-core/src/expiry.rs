//! Concurrent map whose entries carry their own absolute expiration.
//!
//! Expiry is passive: an entry past its deadline is dropped the next time it
//! is read. Time comes from a [`Clock`] so tests can advance it by hand.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Source of monotonic time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_nanos: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            origin: Instant::now(),
            offset_nanos: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

/// Longest time-to-live honoured; larger values are clamped to it.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Deadline `ttl` after `now`, saturating instead of overflowing.
fn deadline(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now)
}

#[derive(Debug, Clone)]
struct Expiring<V> {
    value: V,
    expires_at: Instant,
}

/// Sharded key/value store with per-entry time-to-live.
///
/// Readers of one key never wait on writers of keys in other shards.
pub struct ExpiringMap<K, V> {
    entries: DashMap<K, Expiring<V>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        ExpiringMap {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Live value for `key`, dropping it first if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
        }
        None
    }

    /// Store `value` under `key`, replacing any previous entry and its deadline.
    pub fn insert(&self, key: K, value: V, ttl: Duration) {
        let expires_at = deadline(self.clock.now(), ttl);
        self.entries.insert(key, Expiring { value, expires_at });
    }

    /// Replace the value under `key` with `f(current live value)`, holding the
    /// shard lock so concurrent read-modify-write cycles do not lose updates.
    pub fn upsert<F>(&self, key: K, ttl: Duration, f: F)
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let now = self.clock.now();
        let expires_at = deadline(now, ttl);
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get();
                let live = (current.expires_at > now).then_some(&current.value);
                let value = f(live);
                occupied.insert(Expiring { value, expires_at });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Expiring {
                    value: f(None),
                    expires_at,
                });
            }
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash, V> fmt::Debug for ExpiringMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringMap")
            .field("entries", &self.entries.len())
            .field("clock", &self.clock)
            .finish()
    }
}
