// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for model provider integrations.

use async_trait::async_trait;

use crate::error::WaypointError;
use crate::traits::adapter::PluginAdapter;
use crate::types::GenerationRequest;

/// Adapter for a single model provider (an OpenAI-compatible hub, Anthropic, ...).
///
/// Implementations perform exactly one attempt. Retries, timeouts and
/// fallback across providers belong to the gateway.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends one completion request and returns the raw response text.
    ///
    /// A rate-limit response must surface as [`WaypointError::RateLimited`].
    async fn generate(&self, request: GenerationRequest) -> Result<String, WaypointError>;
}
