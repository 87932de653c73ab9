// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of the cascade from configuration.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use waypoint_agent::CascadePipeline;
use waypoint_cache::{spawn_janitor, CacheRegistry};
use waypoint_config::model::{ProviderConfig, ProviderKind};
use waypoint_config::WaypointConfig;
use waypoint_core::{ProviderAdapter, WaypointError};
use waypoint_models::ModelGateway;
use waypoint_tools::ToolRegistry;

/// Everything a command needs to run requests.
pub struct Runtime {
    pub pipeline: Arc<CascadePipeline>,
    pub caches: Arc<CacheRegistry>,
}

impl Runtime {
    /// Builds the gateway and pipeline and starts the cache janitor.
    ///
    /// The janitor stops when `shutdown` is cancelled.
    pub fn assemble(config: &WaypointConfig, shutdown: &CancellationToken) -> Result<Self, WaypointError> {
        let gateway = Arc::new(build_gateway(config));
        if !gateway.has_provider(&config.gateway.primary_provider) {
            warn!(
                provider = config.gateway.primary_provider.as_str(),
                "primary provider unavailable, model tiers will fall back"
            );
        }

        let caches = Arc::new(CacheRegistry::new());
        let pipeline = CascadePipeline::from_config(config, &caches, ToolRegistry::new(), gateway)?;

        spawn_janitor(
            caches.clone(),
            Duration::from_millis(config.cache.janitor_interval_ms),
            shutdown.child_token(),
        );

        Ok(Self {
            pipeline: Arc::new(pipeline),
            caches,
        })
    }
}

/// Registers every configured provider whose credential resolves.
pub fn build_gateway(config: &WaypointConfig) -> ModelGateway {
    let mut gateway = ModelGateway::new(&config.gateway);
    for (name, provider) in &config.providers {
        match build_provider(name, provider) {
            Ok(adapter) => gateway = gateway.with_provider(name.clone(), adapter),
            Err(e) => warn!(provider = name.as_str(), error = %e, "provider skipped"),
        }
    }
    info!(providers = ?gateway.provider_names(), "model gateway ready");
    gateway
}

fn build_provider(name: &str, config: &ProviderConfig) -> Result<Arc<dyn ProviderAdapter>, WaypointError> {
    match config.kind {
        #[cfg(feature = "openai")]
        ProviderKind::Openai => Ok(Arc::new(waypoint_openai::OpenAiProvider::new(name, config)?)),
        #[cfg(feature = "anthropic")]
        ProviderKind::Anthropic => Ok(Arc::new(waypoint_anthropic::AnthropicProvider::new(name, config)?)),
        #[allow(unreachable_patterns)]
        other => Err(WaypointError::Config(format!(
            "provider `{name}` uses `{other:?}`, which this build does not include"
        ))),
    }
}
