// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The strategy-context dependency, guarded by a shared circuit breaker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use waypoint_core::{Locale, WaypointError};
use waypoint_resilience::CircuitBreaker;

/// Name of the breaker shared by every strategy lookup.
pub const STRATEGY_BREAKER: &str = "strategy_engine";

/// Supplies travel context (crowding, weather, local advice) for a location.
#[async_trait]
pub trait StrategyProvider: Send + Sync {
    /// Returns a short context summary, or `None` when there is nothing to add.
    async fn strategy_context(
        &self,
        location: &str,
        locale: Locale,
    ) -> Result<Option<String>, WaypointError>;
}

/// A [`StrategyProvider`] behind the `strategy_engine` breaker.
#[derive(Clone)]
pub struct GuardedStrategy {
    provider: Arc<dyn StrategyProvider>,
    breaker: Arc<CircuitBreaker>,
}

impl GuardedStrategy {
    pub fn new(provider: Arc<dyn StrategyProvider>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { provider, breaker }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Fetches context through the breaker.
    ///
    /// An open circuit surfaces as [`WaypointError::CircuitOpen`] without
    /// calling the provider; cancellation counts as a failure.
    pub async fn fetch(
        &self,
        location: &str,
        locale: Locale,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, WaypointError> {
        self.breaker
            .execute_with_cancel(cancel, || self.provider.strategy_context(location, locale))
            .await
            .map_err(WaypointError::from)
    }
}

/// Converts the `[breaker]` section into breaker thresholds.
pub fn breaker_config(
    config: &waypoint_config::model::BreakerConfig,
) -> waypoint_resilience::BreakerConfig {
    waypoint_resilience::BreakerConfig {
        failure_threshold: config.failure_threshold,
        reset_timeout: Duration::from_millis(config.reset_timeout_ms),
        half_open_success_threshold: config.half_open_success_threshold,
        call_timeout: config.call_timeout_ms.map(Duration::from_millis),
    }
}
