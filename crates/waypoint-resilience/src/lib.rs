// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Circuit breakers for unreliable async dependencies.
//!
//! A [`CircuitBreaker`] is Closed while its dependency behaves, Open after
//! `failure_threshold` consecutive failures (calls are rejected without being
//! attempted), and HalfOpen once `reset_timeout` has elapsed, admitting probe
//! calls until `half_open_success_threshold` consecutive successes close it
//! again. Timeouts and cancellations count as failures.
//!
//! Breakers are shared by name through a [`BreakerRegistry`].

pub mod breaker;
pub mod registry;

pub use breaker::{
    BreakerConfig, BreakerError, CircuitBreaker, CircuitOpenError, CircuitSnapshot,
    CircuitStatus, TransitionObserver,
};
pub use registry::BreakerRegistry;
