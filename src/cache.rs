use crate::model::WorkItem;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Default validity window of the works cache.
pub const WORKS_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Time source for cache expiry.
pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheEntry<T> {
    payload: Rc<[T]>,
    fetched_at: Instant,
}

/// Single-slot, process-local cache with a fixed time-to-live.
///
/// The payload is handed out as a shared immutable slice. Callers that want
/// to change it build a new collection and `set` it; nothing is patched in
/// place. Access is single-threaded, so the slot sits in a `RefCell`.
pub struct TtlCache<T> {
    ttl: Duration,
    clock: Box<dyn Clock>,
    entry: RefCell<Option<CacheEntry<T>>>,
}

pub type WorksCache = TtlCache<WorkItem>;

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }

    pub fn with_clock(ttl: Duration, clock: impl Clock + 'static) -> Self {
        Self {
            ttl,
            clock: Box::new(clock),
            entry: RefCell::new(None),
        }
    }

    /// The stored payload, or `None` when unset or older than the TTL.
    pub fn get(&self) -> Option<Rc<[T]>> {
        let now = self.clock.now();
        self.entry
            .borrow()
            .as_ref()
            .filter(|e| now.saturating_duration_since(e.fetched_at) < self.ttl)
            .map(|e| Rc::clone(&e.payload))
    }

    /// Replace payload and timestamp. Last write wins.
    pub fn set(&self, payload: impl Into<Rc<[T]>>) {
        *self.entry.borrow_mut() = Some(CacheEntry {
            payload: payload.into(),
            fetched_at: self.clock.now(),
        });
    }

    pub fn invalidate(&self) {
        self.entry.borrow_mut().take();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Hand-driven clock for expiry tests.
#[cfg(test)]
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<std::cell::Cell<Instant>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(std::cell::Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> (TtlCache<u32>, ManualClock) {
        let clock = ManualClock::new();
        (TtlCache::with_clock(WORKS_CACHE_TTL, clock.clone()), clock)
    }

    #[test]
    fn test_empty_cache_is_absent() {
        let (cache, _) = cache();
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_get_within_ttl_returns_payload() {
        let (cache, clock) = cache();
        cache.set(vec![1, 2, 3]);
        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get().as_deref(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn test_get_after_ttl_is_absent() {
        let (cache, clock) = cache();
        cache.set(vec![1]);
        clock.advance(WORKS_CACHE_TTL);
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_set_replaces_payload_and_timestamp() {
        let (cache, clock) = cache();
        cache.set(vec![1]);
        clock.advance(Duration::from_secs(200));
        cache.set(vec![2]);
        clock.advance(Duration::from_secs(200));
        // 400s after the first write, 200s after the second
        assert_eq!(cache.get().as_deref(), Some(&[2][..]));
    }

    #[test]
    fn test_invalidate_within_ttl() {
        let (cache, _) = cache();
        cache.set(vec![7]);
        cache.invalidate();
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_payload_is_shared_not_copied() {
        let (cache, _) = cache();
        cache.set(vec![1, 2]);
        let a = cache.get().unwrap();
        let b = cache.get().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }
}
