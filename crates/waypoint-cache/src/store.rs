// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded TTL key/value store.
//!
//! Entries expire at a fixed deadline. When an insert would exceed
//! `max_size`, expired entries are purged first; if the store is still full,
//! `ceil(max_size * eviction_ratio)` least-recently-used entries are removed.
//! Recency is a per-store monotonic counter, so eviction order depends only
//! on the sequence of operations, never on wall-clock resolution.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::key::generate_key;

/// Size and lifetime limits for one cache namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub max_size: usize,
    pub ttl: Duration,
    pub eviction_ratio: f64,
    /// Longest string field kept verbatim by [`TtlCache::key`].
    pub max_key_chars: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 500,
            ttl: Duration::from_secs(300),
            eviction_ratio: 0.1,
            max_key_chars: 600,
        }
    }
}

impl CacheConfig {
    pub fn new(max_size: usize, ttl: Duration, eviction_ratio: f64) -> Self {
        Self {
            max_size,
            ttl,
            eviction_ratio,
            ..Self::default()
        }
    }

    /// Number of entries removed per overflow. Always at least one.
    pub fn eviction_batch(&self) -> usize {
        let batch = (self.max_size as f64 * self.eviction_ratio).ceil() as usize;
        batch.clamp(1, self.max_size.max(1))
    }
}

/// Point-in-time counters for one cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub namespace: String,
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

#[derive(Debug)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
    last_access: u64,
}

#[derive(Debug)]
struct CacheInner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<T> CacheInner<T> {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before - self.entries.len()
    }
}

/// A namespaced TTL cache safe for concurrent use.
///
/// Values are cloned out on read; store `Arc`s for large payloads.
#[derive(Debug)]
pub struct TtlCache<T> {
    namespace: String,
    config: CacheConfig,
    inner: Mutex<CacheInner<T>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(namespace: impl Into<String>, config: CacheConfig) -> Self {
        Self {
            namespace: namespace.into(),
            config,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                clock: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Derives a key in this cache's namespace. See [`generate_key`].
    pub fn key(&self, params: &serde_json::Value) -> String {
        generate_key(&self.namespace, params, self.config.max_key_chars)
    }

    /// Returns the value if present and not yet expired.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut inner = self.lock();
        let stamp = inner.tick();

        let live = match inner.entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                entry.last_access = stamp;
                Some(entry.value.clone())
            }
            _ => None,
        };
        if live.is_none() {
            inner.entries.remove(key);
        }

        record_lookup(&self.namespace, live.is_some());
        match live {
            Some(value) => {
                inner.hits += 1;
                debug!(namespace = %self.namespace, "cache hit");
                Some(value)
            }
            None => {
                inner.misses += 1;
                debug!(namespace = %self.namespace, "cache miss");
                None
            }
        }
    }

    /// Stores a value with the namespace's default TTL.
    pub fn set(&self, key: impl Into<String>, value: T) {
        self.set_with_ttl(key, value, self.config.ttl);
    }

    /// Stores a value that expires `ttl` from now.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let key = key.into();
        let now = Instant::now();
        let mut inner = self.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.config.max_size {
            self.make_room(&mut inner, now);
        }

        let stamp = inner.tick();
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
                last_access: stamp,
            },
        );
    }

    fn make_room(&self, inner: &mut CacheInner<T>, now: Instant) {
        let purged = inner.purge_expired(now);
        if inner.entries.len() < self.config.max_size {
            debug!(namespace = %self.namespace, purged, "purged expired entries to make room");
            return;
        }

        let batch = self.config.eviction_batch();
        let mut by_recency: Vec<(u64, String)> = inner
            .entries
            .iter()
            .map(|(k, e)| (e.last_access, k.clone()))
            .collect();
        by_recency.sort_unstable();

        for (_, key) in by_recency.into_iter().take(batch) {
            inner.entries.remove(&key);
        }
        inner.evictions += batch as u64;
        debug!(namespace = %self.namespace, evicted = batch, "evicted least recently used entries");
    }

    /// Returns true if a live entry exists. Does not count as a hit or refresh recency.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.lock()
            .entries
            .get(key)
            .is_some_and(|e| e.expires_at > now)
    }

    /// Removes an entry. Returns true if one was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    /// Removes every entry and resets the counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
    }

    /// Drops expired entries and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.lock().purge_expired(Instant::now())
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let lookups = inner.hits + inner.misses;
        CacheStats {
            namespace: self.namespace.clone(),
            size: inner.entries.len(),
            max_size: self.config.max_size,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                inner.hits as f64 / lookups as f64
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<T>> {
        // Every critical section leaves the map consistent, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "prometheus")]
fn record_lookup(namespace: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!(
        "waypoint_cache_lookups_total",
        "namespace" => namespace.to_string(),
        "result" => result
    )
    .increment(1);
}

#[cfg(not(feature = "prometheus"))]
fn record_lookup(_namespace: &str, _hit: bool) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(max_size: usize, ratio: f64) -> TtlCache<u32> {
        TtlCache::new("test", CacheConfig::new(max_size, Duration::from_secs(60), ratio))
    }

    #[tokio::test(start_paused = true)]
    async fn value_lives_until_ttl_then_misses() {
        let cache = small(10, 0.1);
        cache.set_with_ttl("k", 7, Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(99)).await;
        assert_eq!(cache.get("k"), Some(7));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "expired entry is removed on read");
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_evicts_least_recently_used_fraction() {
        let cache = small(10, 0.2);
        for i in 0..10 {
            cache.set(format!("k{i}"), i);
        }
        // Touch k0 and k1 so k2 and k3 are now the oldest.
        assert_eq!(cache.get("k0"), Some(0));
        assert_eq!(cache.get("k1"), Some(1));

        cache.set("k10", 10);

        assert_eq!(cache.len(), 9);
        assert!(cache.contains("k0"));
        assert!(cache.contains("k1"));
        assert!(!cache.contains("k2"));
        assert!(!cache.contains("k3"));
        assert!(cache.contains("k10"));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_prefers_purging_expired_entries() {
        let cache = small(3, 0.5);
        cache.set_with_ttl("short", 1, Duration::from_millis(10));
        cache.set("a", 2);
        cache.set("b", 3);

        tokio::time::advance(Duration::from_millis(20)).await;
        cache.set("c", 4);

        assert!(cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn overwriting_existing_key_never_evicts() {
        let cache = small(2, 0.5);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(3));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_is_deterministic_for_fixed_history() {
        let run = || {
            let cache = small(5, 0.4);
            for i in 0..5 {
                cache.set(format!("k{i}"), i);
            }
            cache.get("k2");
            cache.set("k5", 5);
            let mut live: Vec<String> = (0..6)
                .map(|i| format!("k{i}"))
                .filter(|k| cache.contains(k))
                .collect();
            live.sort();
            live
        };
        assert_eq!(run(), run());
        assert_eq!(run(), vec!["k2", "k3", "k4", "k5"]);
    }

    #[test]
    fn eviction_batch_rounds_up_and_is_at_least_one() {
        assert_eq!(CacheConfig::new(500, Duration::ZERO, 0.1).eviction_batch(), 50);
        assert_eq!(CacheConfig::new(15, Duration::ZERO, 0.1).eviction_batch(), 2);
        assert_eq!(CacheConfig::new(3, Duration::ZERO, 0.01).eviction_batch(), 1);
        assert_eq!(CacheConfig::new(3, Duration::ZERO, 1.0).eviction_batch(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_track_hits_and_misses() {
        let cache = small(10, 0.1);
        cache.set("a", 1);
        cache.get("a");
        cache.get("a");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < f64::EPSILON);

        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_reports_removed_count() {
        let cache = small(10, 0.1);
        cache.set_with_ttl("a", 1, Duration::from_millis(5));
        cache.set_with_ttl("b", 2, Duration::from_millis(5));
        cache.set("c", 3);
        tokio::time::advance(Duration::from_millis(5)).await;
        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn delete_removes_entry() {
        let cache = small(10, 0.1);
        cache.set("a", 1);
        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
    }
}
