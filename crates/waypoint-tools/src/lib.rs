// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain tools as seen by the cascade.
//!
//! Tools themselves live with the surrounding application; this crate only
//! defines the [`Tool`] contract and the [`ToolRegistry`] the pipeline is
//! handed at construction time.

pub mod tool;

pub use tool::{Tool, ToolContext, ToolOutcome, ToolRegistry};
