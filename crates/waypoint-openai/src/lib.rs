// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapter.
//!
//! Any endpoint speaking the `/chat/completions` protocol with Bearer auth
//! (model hubs, DeepSeek, MiniMax) is driven through [`OpenAiProvider`].

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, info};
use waypoint_config::model::ProviderConfig;
use waypoint_core::{
    AdapterType, GenerationRequest, HealthStatus, PluginAdapter, ProviderAdapter, WaypointError,
};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest};

/// Provider adapter for one configured OpenAI-compatible endpoint.
pub struct OpenAiProvider {
    name: String,
    client: OpenAiClient,
}

impl OpenAiProvider {
    /// Builds the adapter for `[providers.<name>]`.
    ///
    /// Fails when no API key can be resolved.
    pub fn new(name: &str, config: &ProviderConfig) -> Result<Self, WaypointError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            WaypointError::Config(format!(
                "provider `{name}` has no API key (set api_key or {})",
                config.api_key_env.as_deref().unwrap_or("api_key_env")
            ))
        })?;
        let client = OpenAiClient::new(name, &api_key, &config.base_url)?;
        info!(provider = name, endpoint = client.endpoint(), "OpenAI-compatible provider initialized");
        Ok(Self {
            name: name.to_string(),
            client,
        })
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
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
        debug!(provider = %self.name, "provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, WaypointError> {
        let body = ChatRequest {
            model: request.model.clone(),
            messages: vec![
                ChatMessage::system(request.system_prompt),
                ChatMessage::user(request.user_prompt),
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let response = self.client.complete(&body, request.timeout).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| WaypointError::provider(format!("{} returned no completion text", self.name)))
    }
}
