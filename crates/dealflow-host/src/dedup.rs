//! Time-windowed set of recently seen submission ids.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// Remembers submission ids for `ttl` so webhook redeliveries do not start a
/// second pipeline run. Expired entries are swept on every check.
#[derive(Debug)]
pub struct SeenCache {
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl SeenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record `id`; `true` when it was not seen within the window.
    pub fn check_and_insert(&self, id: &str) -> bool {
        self.check_at(id, Instant::now())
    }

    fn check_at(&self, id: &str, now: Instant) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = seen.len();
        seen.retain(|_, at| now.saturating_duration_since(*at) < self.ttl);
        if seen.len() != before {
            debug!(expired = before - seen.len(), "swept dedup cache");
        }
        if seen.contains_key(id) {
            return false;
        }
        seen.insert(id.to_string(), now);
        true
    }

    /// Drop `id` so a later delivery is accepted again.
    pub fn forget(&self, id: &str) {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.remove(id);
    }

    pub fn len(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_sighting_is_a_duplicate() {
        let cache = SeenCache::new(Duration::from_secs(60));
        assert!(cache.check_and_insert("tok-1"));
        assert!(!cache.check_and_insert("tok-1"));
        assert!(cache.check_and_insert("tok-2"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = SeenCache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        assert!(cache.check_at("tok", t0));
        assert!(!cache.check_at("tok", t0 + Duration::from_secs(9)));
        assert!(cache.check_at("tok", t0 + Duration::from_secs(10)));
    }

    #[test]
    fn forgotten_id_is_new_again() {
        let cache = SeenCache::new(Duration::from_secs(60));
        assert!(cache.check_and_insert("tok"));
        cache.forget("tok");
        assert!(cache.check_and_insert("tok"));
    }

    #[test]
    fn sweep_drops_stale_ids() {
        let cache = SeenCache::new(Duration::from_secs(5));
        let t0 = Instant::now();
        cache.check_at("a", t0);
        cache.check_at("b", t0);
        cache.check_at("c", t0 + Duration::from_secs(6));
        assert_eq!(cache.len(), 1);
    }
}
