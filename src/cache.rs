//! Bounded in-memory cache with per-entry expiry.
//!
//! Entries are kept in recency order; inserting into a full cache evicts the
//! least-recently-used entry. An entry whose TTL has elapsed is treated as
//! absent even before the background sweep physically removes it.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::{CatalogError, Result};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
    access_count: u64,
    last_accessed_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired_at(&self, now: Instant) -> bool {
        now > self.inserted_at + self.ttl
    }
}

/// Counters exposed for monitoring.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

/// String-keyed cache with LRU eviction and per-entry TTL.
///
/// Not internally synchronized; owners wrap it in a `Mutex` and must not hold
/// the lock across await points.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    // Front is least recently used.
    recency: VecDeque<String>,
    max_size: usize,
    default_ttl: Duration,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(max_size: usize, default_ttl: Duration) -> Result<Self> {
        if max_size == 0 {
            return Err(CatalogError::Cache("cache max_size must be > 0".into()));
        }
        if default_ttl.is_zero() {
            return Err(CatalogError::Cache("cache default ttl must be > 0".into()));
        }
        Ok(Self {
            entries: HashMap::new(),
            recency: VecDeque::new(),
            max_size,
            default_ttl,
            hits: 0,
            misses: 0,
            evictions: 0,
        })
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired_at(now),
        };
        if expired {
            self.remove(key);
            self.misses += 1;
            return None;
        }

        let value = {
            let entry = self.entries.get_mut(key)?;
            entry.access_count += 1;
            entry.last_accessed_at = now;
            entry.value.clone()
        };
        self.touch(key);
        self.hits += 1;
        Some(value)
    }

    pub fn set(&mut self, key: &str, value: V, ttl: Option<Duration>) -> Result<()> {
        self.set_at(key, value, ttl, Instant::now())
    }

    fn set_at(&mut self, key: &str, value: V, ttl: Option<Duration>, now: Instant) -> Result<()> {
        if key.is_empty() {
            return Err(CatalogError::Validation(
                "cache key must be a non-empty string".into(),
            ));
        }

        if self.entries.contains_key(key) {
            self.remove(key);
        } else if self.entries.len() >= self.max_size {
            if let Some(lru) = self.recency.front().cloned() {
                self.remove(&lru);
                self.evictions += 1;
            }
        }

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: now,
                ttl: ttl.unwrap_or(self.default_ttl),
                access_count: 0,
                last_accessed_at: now,
            },
        );
        self.recency.push_back(key.to_string());
        Ok(())
    }

    /// Presence check. Does not count as a hit or miss and does not touch the
    /// recency order, but an expired entry is purged on inspection.
    pub fn contains(&mut self, key: &str) -> bool {
        self.contains_at(key, Instant::now())
    }

    fn contains_at(&mut self, key: &str, now: Instant) -> bool {
        let expired = match self.entries.get(key) {
            None => return false,
            Some(entry) => entry.is_expired_at(now),
        };
        if expired {
            self.remove(key);
            return false;
        }
        true
    }

    /// Sweep all expired entries. Driven by a background interval task.
    pub fn cleanup(&mut self) -> usize {
        self.cleanup_at(Instant::now())
    }

    fn cleanup_at(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired_at(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let requests = self.hits + self.misses;
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate: if requests == 0 {
                0.0
            } else {
                self.hits as f64 / requests as f64
            },
        }
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
            self.recency.push_back(key.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_size: usize) -> TtlCache<i32> {
        TtlCache::new(max_size, Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn rejects_zero_capacity_and_zero_ttl() {
        assert!(TtlCache::<i32>::new(0, Duration::from_secs(1)).is_err());
        assert!(TtlCache::<i32>::new(8, Duration::ZERO).is_err());
    }

    #[test]
    fn rejects_empty_key() {
        let mut c = cache(2);
        assert!(c.set("", 1, None).is_err());
    }

    #[test]
    fn get_after_set_returns_value() {
        let mut c = cache(4);
        c.set("a", 7, None).unwrap();
        assert_eq!(c.get("a"), Some(7));
    }

    #[test]
    fn miss_is_not_an_error() {
        let mut c = cache(4);
        assert_eq!(c.get("missing"), None);
        assert_eq!(c.stats().misses, 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut c = cache(2);
        c.set("a", 1, None).unwrap();
        c.set("b", 2, None).unwrap();
        assert_eq!(c.get("a"), Some(1)); // a becomes most recent
        c.set("c", 3, None).unwrap(); // b is evicted

        assert_eq!(c.get("a"), Some(1));
        assert_eq!(c.get("b"), None);
        assert_eq!(c.get("c"), Some(3));
        assert_eq!(c.stats().evictions, 1);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let mut c = cache(4);
        let t0 = Instant::now();
        c.set_at("a", 1, Some(Duration::from_millis(100)), t0)
            .unwrap();

        let t_expired = t0 + Duration::from_millis(101);
        // Intervening contains() must not extend the lifetime.
        assert!(c.contains_at("a", t0 + Duration::from_millis(50)));
        assert_eq!(c.get_at("a", t_expired), None);
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn contains_purges_expired_without_counting() {
        let mut c = cache(4);
        let t0 = Instant::now();
        c.set_at("a", 1, Some(Duration::from_millis(10)), t0).unwrap();

        assert!(!c.contains_at("a", t0 + Duration::from_millis(11)));
        assert_eq!(c.len(), 0);
        let stats = c.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn contains_does_not_touch_recency() {
        let mut c = cache(2);
        c.set("a", 1, None).unwrap();
        c.set("b", 2, None).unwrap();
        assert!(c.contains("a"));
        // a is still least recently used, so it is the one evicted.
        c.set("c", 3, None).unwrap();
        assert_eq!(c.get("a"), None);
        assert_eq!(c.get("b"), Some(2));
    }

    #[test]
    fn cleanup_sweeps_only_expired() {
        let mut c = cache(8);
        let t0 = Instant::now();
        c.set_at("short", 1, Some(Duration::from_millis(10)), t0)
            .unwrap();
        c.set_at("long", 2, Some(Duration::from_secs(60)), t0)
            .unwrap();

        let removed = c.cleanup_at(t0 + Duration::from_millis(20));
        assert_eq!(removed, 1);
        assert_eq!(c.len(), 1);
        assert_eq!(c.get_at("long", t0 + Duration::from_millis(20)), Some(2));
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let mut c = cache(2);
        c.set("a", 1, None).unwrap();
        c.set("a", 2, None).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("a"), Some(2));
    }

    #[test]
    fn hit_rate_zero_without_requests() {
        let c = cache(2);
        assert_eq!(c.stats().hit_rate, 0.0);
    }
}
