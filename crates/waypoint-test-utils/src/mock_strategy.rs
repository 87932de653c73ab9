// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock strategy-context dependency.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use waypoint_agent::StrategyProvider;
use waypoint_core::{Locale, WaypointError};

/// A strategy provider with a switchable outcome and a call counter.
pub struct MockStrategy {
    context: Option<String>,
    failing: AtomicBool,
    hang: bool,
    calls: AtomicUsize,
}

impl MockStrategy {
    /// Answers every lookup with `context`.
    pub fn healthy(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            failing: AtomicBool::new(false),
            hang: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every lookup until [`set_failing(false)`](Self::set_failing).
    pub fn failing() -> Self {
        let strategy = Self::healthy("recovered context");
        strategy.set_failing(true);
        strategy
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::healthy("unreachable")
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StrategyProvider for MockStrategy {
    async fn strategy_context(
        &self,
        _location: &str,
        _locale: Locale,
    ) -> Result<Option<String>, WaypointError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            return std::future::pending().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(WaypointError::provider("strategy engine unavailable"));
        }
        Ok(self.context.clone())
    }
}
