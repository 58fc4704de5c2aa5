use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// How long a table read from the remote store is trusted.
pub const TABLE_TTL: Duration = Duration::from_secs(60);

/// Source of "now" for cache expiry. Swapped for a manual clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self { now: Arc::new(Mutex::new(Instant::now())) }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.lock().map(|now| *now).unwrap_or_else(|e| *e.into_inner())
    }
}

/// Single-entry cache holding one value for a fixed time-to-live.
pub struct TtlCache<T> {
    entry: Option<(T, Instant)>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: fmt::Debug> fmt::Debug for TtlCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("entry", &self.entry)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { entry: None, ttl, clock }
    }

    /// The cached value, unless it is missing or older than the TTL.
    pub fn get(&self) -> Option<T> {
        let (value, stored_at) = self.entry.as_ref()?;
        let age = self.clock.now().saturating_duration_since(*stored_at);
        (age < self.ttl).then(|| value.clone())
    }

    pub fn insert(&mut self, value: T) {
        self.entry = Some((value, self.clock.now()));
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(clock: &ManualClock) -> TtlCache<Vec<String>> {
        TtlCache::new(TABLE_TTL, Arc::new(clock.clone()))
    }

    #[test]
    fn empty_cache_misses() {
        let clock = ManualClock::default();
        assert!(cache(&clock).get().is_none());
    }

    #[test]
    fn value_is_served_until_ttl_elapses() {
        let clock = ManualClock::default();
        let mut cache = cache(&clock);
        cache.insert(vec!["Moti".into()]);

        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get(), Some(vec!["Moti".to_string()]));

        clock.advance(Duration::from_secs(1));
        assert!(cache.get().is_none(), "entry must expire at the TTL boundary");
    }

    #[test]
    fn invalidate_drops_the_entry() {
        let clock = ManualClock::default();
        let mut cache = cache(&clock);
        cache.insert(vec!["Chen".into()]);
        cache.invalidate();
        assert!(cache.get().is_none());
    }

    #[test]
    fn insert_restarts_the_window() {
        let clock = ManualClock::default();
        let mut cache = cache(&clock);
        cache.insert(vec!["Uri".into()]);
        clock.advance(Duration::from_secs(45));
        cache.insert(vec!["Baki".into()]);
        clock.advance(Duration::from_secs(45));
        assert_eq!(cache.get(), Some(vec!["Baki".to_string()]));
    }
}
