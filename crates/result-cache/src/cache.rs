use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A single cached value together with its expiry deadline.
#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A mutex-guarded map whose entries expire after a fixed time-to-live.
///
/// Values are cloned out on read, so callers hold snapshots rather than
/// references into the cache. Expired entries are removed lazily when the
/// key is next touched.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    inner: Mutex<HashMap<K, Entry<V>>>,
    default_ttl: Duration,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Create an empty cache whose [`set`](Self::set) calls use `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// The time-to-live applied by [`set`](Self::set).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up `key`, returning a clone of the live value if one exists.
    ///
    /// An entry whose deadline has passed is removed and reported as absent.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut map = self.lock();
        match map.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => {
                tracing::trace!("dropping expired cache entry");
                map.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert `value` under `key` with the default time-to-live, replacing
    /// any previous entry.
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Insert `value` under `key` with an explicit time-to-live.
    ///
    /// A zero `ttl` produces an entry that is already expired; the next
    /// `get` will miss.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.lock().insert(key, entry);
    }

    /// Remove the entry under `key`. Returns `true` if one was present
    /// (expired or not).
    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Entry<V>>> {
        // A poisoned lock only means another thread panicked while holding
        // it; the map itself is still structurally sound, so recover it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
