// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric hooks, compiled to no-ops without the `prometheus` feature.

use waypoint_resilience::TransitionObserver;

use crate::pipeline::CascadeSource;

/// Breaker observer that counts state transitions.
#[cfg(feature = "prometheus")]
pub fn transition_observer() -> Option<TransitionObserver> {
    use waypoint_resilience::CircuitStatus;

    Some(std::sync::Arc::new(|name: &str, status: CircuitStatus| {
        waypoint_prometheus::record_breaker_transition(name, &status.to_string());
    }))
}

#[cfg(not(feature = "prometheus"))]
pub fn transition_observer() -> Option<TransitionObserver> {
    None
}

#[cfg(feature = "prometheus")]
pub(crate) fn record_request(source: CascadeSource) {
    waypoint_prometheus::record_request(source.as_str());
}

#[cfg(not(feature = "prometheus"))]
pub(crate) fn record_request(_source: CascadeSource) {}
