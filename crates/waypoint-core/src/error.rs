// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Waypoint decision cascade.

use std::time::Duration;

use thiserror::Error;

/// The primary error type shared by every tier of the cascade.
///
/// Tiers absorb their own failures and hand the caller an empty result;
/// this type is what travels between a tier and the dependency it calls.
#[derive(Debug, Error)]
pub enum WaypointError {
    /// Configuration errors (invalid TOML, missing provider, bad regex).
    #[error("configuration error: {0}")]
    Config(String),

    /// Model provider errors (transport failure, non-success status, bad body).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider answered with a rate-limit signal (HTTP 429).
    #[error("rate limited by {provider} while using {model}")]
    RateLimited { provider: String, model: String },

    /// Operation exceeded its time budget.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// A circuit breaker rejected the call without attempting it.
    #[error("circuit `{name}` is open")]
    CircuitOpen { name: String },

    /// The originating request was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The model named a tool outside the candidate set or returned unparsable output.
    #[error("invalid tool selection: {reason}")]
    ToolSelectionInvalid { reason: String },

    /// A domain tool failed while executing.
    #[error("tool `{name}` failed: {message}")]
    Tool { name: String, message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WaypointError {
    /// Returns true when the provider signalled a rate limit.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, WaypointError::RateLimited { .. })
    }

    /// Returns true for errors that should count against a dependency's health.
    ///
    /// Timeouts and cancellations are accounted exactly like transport failures.
    pub fn counts_as_provider_failure(&self) -> bool {
        matches!(
            self,
            WaypointError::Provider { .. }
                | WaypointError::RateLimited { .. }
                | WaypointError::Timeout { .. }
                | WaypointError::Cancelled
        )
    }

    /// Builds a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        WaypointError::Provider {
            message: message.into(),
            status: None,
            source: None,
        }
    }
}
