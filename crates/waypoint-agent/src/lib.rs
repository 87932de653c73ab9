// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handling for the Waypoint decision cascade.
//!
//! The [`CascadePipeline`] is the central coordinator that:
//! - Answers template matches without touching any model
//! - Classifies everything else and picks tool and/or model stages by level
//! - Consults the strategy-context dependency through its circuit breaker
//! - Returns a localized fallback when every tier fails or the request is cancelled

pub mod fallback;
pub mod pipeline;
pub mod shutdown;
pub mod strategy;
pub mod telemetry;

pub use fallback::fallback_message;
pub use pipeline::{CascadePipeline, CascadeRequest, CascadeResponse, CascadeSource};
pub use shutdown::install_signal_handler;
pub use strategy::{breaker_config, GuardedStrategy, StrategyProvider, STRATEGY_BREAKER};
pub use telemetry::transition_observer;
