// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named cache factory.
//!
//! Components ask the registry for a cache by namespace instead of owning a
//! private store, so statistics and maintenance cover every cache in the
//! process from one place.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use waypoint_core::WaypointError;

use crate::store::{CacheConfig, CacheStats, TtlCache};

/// Type-erased maintenance surface of a [`TtlCache`].
trait CacheMaintenance: Send + Sync {
    fn stats(&self) -> CacheStats;
    fn clear(&self);
    fn purge_expired(&self) -> usize;
}

impl<T: Clone + Send + 'static> CacheMaintenance for TtlCache<T> {
    fn stats(&self) -> CacheStats {
        TtlCache::stats(self)
    }

    fn clear(&self) {
        TtlCache::clear(self)
    }

    fn purge_expired(&self) -> usize {
        TtlCache::purge_expired(self)
    }
}

struct Registered {
    typed: Arc<dyn Any + Send + Sync>,
    maintenance: Arc<dyn CacheMaintenance>,
}

/// Registry of caches keyed by namespace.
#[derive(Default)]
pub struct CacheRegistry {
    caches: Mutex<BTreeMap<String, Registered>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cache for `namespace`, creating it with `config` on first use.
    ///
    /// Later calls return the existing instance and ignore `config`. Asking for
    /// an existing namespace with a different value type is an error.
    pub fn get_cache<T>(
        &self,
        namespace: &str,
        config: CacheConfig,
    ) -> Result<Arc<TtlCache<T>>, WaypointError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut caches = self.caches.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = caches.get(namespace) {
            return existing
                .typed
                .clone()
                .downcast::<TtlCache<T>>()
                .map_err(|_| {
                    WaypointError::Internal(format!(
                        "cache `{namespace}` already exists with a different value type"
                    ))
                });
        }

        let cache = Arc::new(TtlCache::<T>::new(namespace, config));
        caches.insert(
            namespace.to_string(),
            Registered {
                typed: cache.clone(),
                maintenance: cache.clone(),
            },
        );
        debug!(namespace, "cache created");
        Ok(cache)
    }

    /// Clears one namespace. Returns false if it does not exist.
    pub fn clear(&self, namespace: &str) -> bool {
        match self.maintenance(namespace) {
            Some(cache) => {
                cache.clear();
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&self) {
        for cache in self.all_maintenance() {
            cache.clear();
        }
    }

    /// Purges expired entries from every cache. Returns the total removed.
    pub fn purge_all(&self) -> usize {
        self.all_maintenance()
            .iter()
            .map(|cache| cache.purge_expired())
            .sum()
    }

    /// Statistics for every cache, ordered by namespace.
    pub fn all_stats(&self) -> Vec<CacheStats> {
        self.all_maintenance()
            .iter()
            .map(|cache| cache.stats())
            .collect()
    }

    fn maintenance(&self, namespace: &str) -> Option<Arc<dyn CacheMaintenance>> {
        self.caches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
            .map(|r| r.maintenance.clone())
    }

    // Snapshot so maintenance never runs under the registry lock.
    fn all_maintenance(&self) -> Vec<Arc<dyn CacheMaintenance>> {
        self.caches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|r| r.maintenance.clone())
            .collect()
    }
}

/// Spawns a task purging expired entries from every registered cache each `interval`.
///
/// Runs until `cancel` fires.
pub fn spawn_janitor(
    registry: Arc<CacheRegistry>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if interval.is_zero() {
            warn!("cache janitor disabled: zero interval");
            return;
        }
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("cache janitor stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let purged = registry.purge_all();
                    if purged > 0 {
                        debug!(purged, "cache janitor purged expired entries");
                    }
                }
            }
        }
    })
}
