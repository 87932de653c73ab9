// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model gateway for the Waypoint decision cascade.
//!
//! This crate provides:
//! - [`PolicyTable`]: task type to model, timeout and output budget
//! - [`ModelGateway`]: provider selection, rate-limit downgrade and secondary fallback
//! - [`sanitize_output`] and [`detect_degraded`]: post-processing of raw model text
//!
//! The gateway implements [`ResponseGenerator`](waypoint_core::ResponseGenerator),
//! so it never fails past its boundary: an unrecoverable call yields `None`.

pub mod degraded;
pub mod gateway;
pub mod policy;
pub mod sanitize;

pub use degraded::{detect_degraded, DegradedNotice};
pub use gateway::{ModelGateway, RouteDecision};
pub use policy::{ModelPolicy, PolicyTable};
pub use sanitize::sanitize_output;
