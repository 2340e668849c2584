use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A single cached value with a time-to-live; the one-entry counterpart of
/// [`TtlCache`](crate::TtlCache).
///
/// Used for results that are global rather than keyed, such as a "current
/// snapshot" that every caller shares.
#[derive(Debug)]
pub struct TtlSlot<V> {
    inner: Mutex<Option<SlotEntry<V>>>,
    default_ttl: Duration,
}

#[derive(Debug)]
struct SlotEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V: Clone> TtlSlot<V> {
    /// Create an empty slot whose [`set`](Self::set) calls use `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(None),
            default_ttl,
        }
    }

    /// Return a clone of the stored value if it has not expired.
    pub fn get(&self) -> Option<V> {
        let now = Instant::now();
        let mut guard = self.lock();
        match guard.as_ref() {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                tracing::trace!("dropping expired cache slot value");
                *guard = None;
                None
            }
            None => None,
        }
    }

    /// Store `value` with the default time-to-live, replacing any previous
    /// value.
    pub fn set(&self, value: V) {
        self.set_with_ttl(value, self.default_ttl);
    }

    /// Store `value` with an explicit time-to-live.
    pub fn set_with_ttl(&self, value: V, ttl: Duration) {
        *self.lock() = Some(SlotEntry {
            value,
            expires_at: Instant::now() + ttl,
        });
    }

    /// Drop the stored value, if any. Returns `true` if one was present.
    pub fn invalidate(&self) -> bool {
        self.lock().take().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<SlotEntry<V>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_is_absent() {
        let slot: TtlSlot<u32> = TtlSlot::new(Duration::from_secs(60));
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let slot = TtlSlot::new(Duration::from_secs(60));
        slot.set(vec![1, 2, 3]);
        assert_eq!(slot.get(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn zero_ttl_value_is_already_expired() {
        let slot = TtlSlot::new(Duration::from_secs(60));
        slot.set_with_ttl(7u32, Duration::ZERO);
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn invalidate_empties_the_slot() {
        let slot = TtlSlot::new(Duration::from_secs(60));
        slot.set(7u32);
        assert!(slot.invalidate());
        assert_eq!(slot.get(), None);
        assert!(!slot.invalidate());
    }
}
