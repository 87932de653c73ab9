// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task-aware model gateway with a bounded fallback chain.
//!
//! Resolution order: explicit model override (routed by substring) > policy table.
//! A call then runs through at most three attempts:
//! 1. the routed provider and model;
//! 2. on a rate limit at the primary hub, its cheapest model (once);
//! 3. on any remaining failure of a policy-routed task that names a
//!    `fallback_model`, the secondary provider (once, only if registered).
//!
//! Every attempt is bounded by the task's timeout budget.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use waypoint_config::model::{GatewayConfig, ModelRoute};
use waypoint_core::{GenerateParams, GenerationRequest, ProviderAdapter, ResponseGenerator, WaypointError};

use crate::degraded::detect_degraded;
use crate::policy::PolicyTable;
use crate::sanitize::sanitize_output;

/// Where a call is sent before any fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub provider: String,
    pub model: String,
    /// True when the caller named the model explicitly.
    pub overridden: bool,
}

/// Routes [`GenerateParams`] to registered providers.
pub struct ModelGateway {
    providers: HashMap<String, Arc<dyn ProviderAdapter>>,
    primary: String,
    secondary: Option<String>,
    cheapest_model: String,
    policies: PolicyTable,
    routes: Vec<ModelRoute>,
}

impl ModelGateway {
    /// Creates a gateway with no providers registered.
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            providers: HashMap::new(),
            primary: config.primary_provider.clone(),
            secondary: config.secondary_provider.clone(),
            cheapest_model: config.cheapest_model.clone(),
            policies: PolicyTable::from_config(config),
            routes: config.model_routes.clone(),
        }
    }

    /// Registers `adapter` under `name`.
    ///
    /// The secondary provider only takes part in fallback once it is registered,
    /// which callers do only when its credential resolved.
    pub fn with_provider(mut self, name: impl Into<String>, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.providers.insert(name.into(), adapter);
        self
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered provider names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    fn configured_secondary(&self) -> Option<&str> {
        self.secondary
            .as_deref()
            .filter(|name| self.providers.contains_key(*name))
    }

    /// Resolves the provider and model a call starts on.
    pub fn route(&self, params: &GenerateParams) -> RouteDecision {
        if let Some(model) = params.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            let lower = model.to_lowercase();
            let provider = self
                .routes
                .iter()
                .find(|route| lower.contains(&route.contains.to_lowercase()))
                .map(|route| route.provider.clone())
                .unwrap_or_else(|| self.primary.clone());
            return RouteDecision {
                provider,
                model: model.to_string(),
                overridden: true,
            };
        }

        RouteDecision {
            provider: self.primary.clone(),
            model: self.policies.get(params.task_type).model.clone(),
            overridden: false,
        }
    }

    /// Runs the fallback chain and returns sanitized text or the last error.
    pub async fn generate(&self, params: &GenerateParams) -> Result<String, WaypointError> {
        let policy = self.policies.get(params.task_type);
        let decision = self.route(params);
        let request = GenerationRequest {
            model: decision.model.clone(),
            system_prompt: params.system_prompt.clone(),
            user_prompt: params.user_prompt.clone(),
            temperature: params.temperature.unwrap_or(policy.temperature),
            max_tokens: self.policies.max_tokens(params.task_type, params.max_tokens),
            timeout: policy.timeout,
        };

        debug!(
            task = %params.task_type,
            provider = decision.provider.as_str(),
            model = decision.model.as_str(),
            overridden = decision.overridden,
            "routing model call"
        );

        let mut last_error = match self.attempt(&decision.provider, request.clone()).await {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        // The cheapest model is served by the primary hub only.
        if last_error.is_rate_limit()
            && policy.allow_downgrade
            && decision.provider == self.primary
            && !request.model.eq_ignore_ascii_case(&self.cheapest_model)
        {
            info!(
                task = %params.task_type,
                from = request.model.as_str(),
                to = self.cheapest_model.as_str(),
                "rate limited, downgrading to cheapest model"
            );
            let downgraded = GenerationRequest {
                model: self.cheapest_model.clone(),
                ..request.clone()
            };
            match self.attempt(&decision.provider, downgraded).await {
                Ok(text) => return Ok(text),
                Err(err) => last_error = err,
            }
        }

        if decision.overridden {
            return Err(last_error);
        }

        let fallback = policy
            .fallback_model
            .as_deref()
            .zip(self.configured_secondary())
            .filter(|(_, secondary)| *secondary != decision.provider);
        if let Some((fallback_model, secondary)) = fallback {
            info!(
                task = %params.task_type,
                provider = secondary,
                model = fallback_model,
                "primary failed, trying secondary provider"
            );
            let retry = GenerationRequest {
                model: fallback_model.to_string(),
                ..request
            };
            match self.attempt(secondary, retry).await {
                Ok(text) => return Ok(text),
                Err(err) => last_error = err,
            }
        }

        Err(last_error)
    }

    async fn attempt(&self, provider_name: &str, request: GenerationRequest) -> Result<String, WaypointError> {
        let provider = self.providers.get(provider_name).ok_or_else(|| {
            WaypointError::Config(format!("provider `{provider_name}` is not registered"))
        })?;

        let budget = request.timeout;
        let model = request.model.clone();
        let started = Instant::now();
        let outcome = tokio::time::timeout(budget, provider.generate(request)).await;
        record_latency(provider_name, started);

        let raw = match outcome {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                warn!(provider = provider_name, model = model.as_str(), error = %err, "model call failed");
                return Err(err);
            }
            Err(_) => {
                warn!(provider = provider_name, model = model.as_str(), timeout = ?budget, "model call timed out");
                return Err(WaypointError::Timeout { duration: budget });
            }
        };

        let text = sanitize_output(&raw);
        if text.is_empty() {
            warn!(provider = provider_name, model = model.as_str(), "model returned no usable text");
            return Err(WaypointError::provider("empty model response"));
        }
        if let Some(notice) = detect_degraded(&text) {
            warn!(
                provider = provider_name,
                model = model.as_str(),
                language = notice.language,
                label = notice.label,
                "model returned a busy notice"
            );
            return Err(WaypointError::provider("provider returned a busy notice"));
        }
        Ok(text)
    }
}

#[cfg(feature = "prometheus")]
fn record_latency(provider: &str, started: Instant) {
    metrics::histogram!("waypoint_provider_latency_seconds", "provider" => provider.to_string())
        .record(started.elapsed().as_secs_f64());
}

#[cfg(not(feature = "prometheus"))]
fn record_latency(_provider: &str, _started: Instant) {}

#[async_trait]
impl ResponseGenerator for ModelGateway {
    async fn generate_response(&self, params: GenerateParams) -> Option<String> {
        match self.generate(&params).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(task = %params.task_type, error = %err, "model gateway gave up");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::TaskType;

    fn gateway() -> ModelGateway {
        ModelGateway::new(&GatewayConfig::default())
    }

    #[test]
    fn policy_route_uses_primary_and_task_model() {
        let decision = gateway().route(&GenerateParams::new(TaskType::Classification, "s", "u"));
        assert_eq!(decision.provider, "hub");
        assert_eq!(decision.model, "gemini-2.5-flash-lite");
        assert!(!decision.overridden);
    }

    #[test]
    fn override_is_routed_by_substring() {
        let gw = gateway();
        let minimax = gw.route(&GenerateParams::new(TaskType::Chat, "s", "u").with_model("MiniMax-M2.1"));
        assert_eq!(minimax.provider, "minimax");
        assert!(minimax.overridden);

        let deepseek = gw.route(&GenerateParams::new(TaskType::Chat, "s", "u").with_model("DeepSeek-V3.2"));
        assert_eq!(deepseek.provider, "hub");
        assert_eq!(deepseek.model, "DeepSeek-V3.2");
    }

    #[test]
    fn unknown_override_goes_to_primary() {
        let decision = gateway().route(&GenerateParams::new(TaskType::Chat, "s", "u").with_model("llama-4"));
        assert_eq!(decision.provider, "hub");
    }

    #[test]
    fn blank_override_is_ignored() {
        let decision = gateway().route(&GenerateParams::new(TaskType::Chat, "s", "u").with_model("  "));
        assert!(!decision.overridden);
        assert_eq!(decision.model, "deepseek-v3.2");
    }

    #[test]
    fn unregistered_secondary_is_not_configured() {
        assert!(gateway().configured_secondary().is_none());
    }
}
