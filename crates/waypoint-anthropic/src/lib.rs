// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API provider adapter.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, info};
use waypoint_config::model::ProviderConfig;
use waypoint_core::{
    AdapterType, GenerationRequest, HealthStatus, PluginAdapter, ProviderAdapter, WaypointError,
};

use crate::client::{AnthropicClient, DEFAULT_API_VERSION};
use crate::types::{ApiMessage, MessageRequest};

/// Anthropic provider implementing [`ProviderAdapter`].
pub struct AnthropicProvider {
    name: String,
    client: AnthropicClient,
}

impl AnthropicProvider {
    /// Builds the adapter for `[providers.<name>]`.
    pub fn new(name: &str, config: &ProviderConfig) -> Result<Self, WaypointError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            WaypointError::Config(format!("provider `{name}` has no API key"))
        })?;
        let version = config.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION);
        let client = AnthropicClient::new(name, &api_key, version, &config.base_url)?;
        info!(provider = name, api_version = version, "Anthropic provider initialized");
        Ok(Self {
            name: name.to_string(),
            client,
        })
    }

    fn to_message_request(request: &GenerationRequest) -> MessageRequest {
        let system = Some(request.system_prompt.clone()).filter(|s| !s.trim().is_empty());
        MessageRequest {
            model: request.model.clone(),
            system,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.user_prompt.clone(),
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, WaypointError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WaypointError> {
        debug!(provider = %self.name, "Anthropic provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, WaypointError> {
        let body = Self::to_message_request(&request);
        let response = self.client.complete_message(&body, request.timeout).await?;
        let text = response.text();
        if text.is_empty() {
            return Err(WaypointError::provider(format!(
                "{} returned no text content",
                self.name
            )));
        }
        Ok(text)
    }
}
