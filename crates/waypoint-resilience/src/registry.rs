// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide lookup of circuit breakers by dependency name.

use std::sync::Arc;

use dashmap::DashMap;

use crate::breaker::{BreakerConfig, CircuitBreaker, CircuitSnapshot, TransitionObserver};

/// Shares one [`CircuitBreaker`] per guarded dependency.
///
/// Every caller asking for the same name gets the same instance, so failures
/// observed by one request protect all the others.
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    default_config: BreakerConfig,
    observer: Option<TransitionObserver>,
}

impl BreakerRegistry {
    pub fn new(default_config: BreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            default_config,
            observer: None,
        }
    }

    /// Attaches `observer` to every breaker created from now on.
    pub fn with_observer(mut self, observer: TransitionObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the breaker for `name`, creating it with the default config.
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get_or_create(name, self.default_config.clone())
    }

    /// Returns the breaker for `name`, creating it with `config` on first use.
    pub fn get_or_create(&self, name: &str, config: BreakerConfig) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                let breaker = CircuitBreaker::new(name, config);
                Arc::new(match &self.observer {
                    Some(observer) => breaker.with_observer(observer.clone()),
                    None => breaker,
                })
            })
            .clone()
    }

    /// Snapshots of every breaker, ordered by name.
    pub fn snapshots(&self) -> Vec<CircuitSnapshot> {
        let mut all: Vec<CircuitSnapshot> =
            self.breakers.iter().map(|b| b.value().snapshot()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
