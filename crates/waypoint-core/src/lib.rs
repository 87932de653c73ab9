// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Waypoint decision cascade.
//!
//! This crate provides the error taxonomy, the request/response types shared
//! by every tier of the cascade, and the adapter traits that model providers
//! and response generators implement.

pub mod error;
pub mod traits;
pub mod types;

pub use error::WaypointError;
pub use types::{
    AdapterType, DecisionLevel, GenerateParams, GenerationRequest, HealthStatus, Locale, TaskType,
    ToolDefinition, ToolSelection,
};

pub use traits::{PluginAdapter, ProviderAdapter, ResponseGenerator};
