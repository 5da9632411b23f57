//! Predictive Preload Cache
//!
//! TTL-bounded key/value store for speculative fetch results. Network
//! responses may complete out of order relative to issuance, so writes are
//! guarded by the request timestamp: a response whose `requested_at` is older
//! than the stored entry's never overwrites it (last-issued-wins, not
//! last-arrived-wins). Expired entries are pruned lazily on lookup and read
//! identically to absent ones.

use crate::time::clock::Timestamp;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Default entry lifetime
pub const DEFAULT_TTL_MS: u64 = 30_000;

/// A cached speculative fetch result
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadEntry {
    pub payload: serde_json::Value,
    /// When the producing request was issued
    pub requested_at: Timestamp,
    pub ttl_ms: u64,
}

impl PreloadEntry {
    /// Valid while `now - requested_at < ttl_ms`.
    pub fn is_live(&self, now: Timestamp) -> bool {
        now.millis_since(self.requested_at) < self.ttl_ms
    }
}

/// Shared preload store. Interior mutability so in-flight fetch
/// continuations can write while the engine stays borrowable.
pub struct PreloadCache {
    entries: Mutex<HashMap<String, PreloadEntry>>,
    ttl_ms: u64,
}

impl PreloadCache {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_ms,
        }
    }

    /// Apply a completed fetch, unless a fresher request already wrote the
    /// key. Returns true if the entry was stored.
    pub fn insert_if_fresher(
        &self,
        key: &str,
        payload: serde_json::Value,
        requested_at: Timestamp,
    ) -> bool {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(key) {
            if requested_at < existing.requested_at {
                return false;
            }
        }
        entries.insert(
            key.to_string(),
            PreloadEntry {
                payload,
                requested_at,
                ttl_ms: self.ttl_ms,
            },
        );
        true
    }

    /// Check for a live entry. Expired entries are removed and read as
    /// absent.
    pub fn is_preloaded(&self, key: &str, now: Timestamp) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => true,
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Remove and return a live payload, if any.
    pub fn take(&self, key: &str, now: Timestamp) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock();
        match entries.remove(key) {
            Some(entry) if entry.is_live(now) => Some(entry.payload),
            _ => None,
        }
    }

    /// Keys with a live entry, for reporting.
    pub fn live_keys(&self, now: Timestamp) -> Vec<String> {
        let entries = self.entries.lock();
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_live_immediately_after_insert() {
        let cache = PreloadCache::new(DEFAULT_TTL_MS);
        cache.insert_if_fresher("payroll_data", json!({"rows": 3}), ts(0));
        assert!(cache.is_preloaded("payroll_data", ts(0)));
        assert!(cache.is_preloaded("payroll_data", ts(29_000)));
    }

    #[test]
    fn test_expired_at_ttl_boundary() {
        let cache = PreloadCache::new(DEFAULT_TTL_MS);
        cache.insert_if_fresher("payroll_data", json!({}), ts(0));
        // now - requested_at >= 30_000 reads as absent
        assert!(!cache.is_preloaded("payroll_data", ts(30_000)));
        assert!(!cache.is_preloaded("payroll_data", ts(31_000)));
    }

    #[test]
    fn test_expired_entry_is_pruned() {
        let cache = PreloadCache::new(100);
        cache.insert_if_fresher("k", json!(1), ts(0));
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_preloaded("k", ts(200)));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_absent_key_is_not_preloaded() {
        let cache = PreloadCache::new(DEFAULT_TTL_MS);
        assert!(!cache.is_preloaded("never", ts(0)));
    }

    #[test]
    fn test_stale_response_is_rejected() {
        let cache = PreloadCache::new(DEFAULT_TTL_MS);

        // Response for the request issued at t=100 arrives first...
        assert!(cache.insert_if_fresher("client_data", json!({"issued": 100}), ts(100)));
        // ...then the response for the t=0 request straggles in
        assert!(!cache.insert_if_fresher("client_data", json!({"issued": 0}), ts(0)));

        let payload = cache.take("client_data", ts(200)).expect("live entry");
        assert_eq!(payload, json!({"issued": 100}));
    }

    #[test]
    fn test_equal_timestamp_overwrites() {
        let cache = PreloadCache::new(DEFAULT_TTL_MS);
        cache.insert_if_fresher("k", json!("first"), ts(50));
        // requested_at >= stored requested_at: the write applies
        assert!(cache.insert_if_fresher("k", json!("second"), ts(50)));
        assert_eq!(cache.take("k", ts(60)), Some(json!("second")));
    }

    #[test]
    fn test_fresher_response_overwrites() {
        let cache = PreloadCache::new(DEFAULT_TTL_MS);
        cache.insert_if_fresher("k", json!("old"), ts(0));
        assert!(cache.insert_if_fresher("k", json!("new"), ts(500)));
        assert_eq!(cache.take("k", ts(600)), Some(json!("new")));
    }

    #[test]
    fn test_take_removes_entry() {
        let cache = PreloadCache::new(DEFAULT_TTL_MS);
        cache.insert_if_fresher("k", json!(42), ts(0));
        assert_eq!(cache.take("k", ts(10)), Some(json!(42)));
        assert!(cache.take("k", ts(10)).is_none());
    }

    #[test]
    fn test_take_expired_is_none() {
        let cache = PreloadCache::new(100);
        cache.insert_if_fresher("k", json!(42), ts(0));
        assert!(cache.take("k", ts(100)).is_none());
    }

    #[test]
    fn test_live_keys_sorted_and_filtered() {
        let cache = PreloadCache::new(100);
        cache.insert_if_fresher("b", json!(1), ts(0));
        cache.insert_if_fresher("a", json!(2), ts(50));
        cache.insert_if_fresher("c", json!(3), ts(90));

        let keys = cache.live_keys(ts(120));
        assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_clear() {
        let cache = PreloadCache::new(DEFAULT_TTL_MS);
        cache.insert_if_fresher("k", json!(1), ts(0));
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.is_preloaded("k", ts(1)));
    }
}
