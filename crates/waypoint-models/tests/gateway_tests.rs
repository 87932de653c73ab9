// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fallback-chain behavior of the model gateway against scripted providers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use waypoint_config::model::{GatewayConfig, PolicyOverride};
use waypoint_core::{
    AdapterType, GenerateParams, GenerationRequest, HealthStatus, PluginAdapter, ProviderAdapter,
    ResponseGenerator, TaskType, WaypointError,
};
use waypoint_models::ModelGateway;

enum Step {
    Reply(&'static str),
    Fail,
    RateLimit,
    Hang,
}

struct ScriptedProvider {
    name: &'static str,
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    fn new(name: &'static str, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            name,
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PluginAdapter for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
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
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, WaypointError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Fail);
        match step {
            Step::Reply(text) => Ok(text.to_string()),
            Step::Fail => Err(WaypointError::Provider {
                message: "API returned 502".into(),
                status: Some(502),
                source: None,
            }),
            Step::RateLimit => Err(WaypointError::RateLimited {
                provider: self.name.to_string(),
                model,
            }),
            Step::Hang => std::future::pending().await,
        }
    }
}

fn gateway(hub: &Arc<ScriptedProvider>, minimax: Option<&Arc<ScriptedProvider>>) -> ModelGateway {
    let mut gw = ModelGateway::new(&GatewayConfig::default()).with_provider("hub", hub.clone());
    if let Some(secondary) = minimax {
        gw = gw.with_provider("minimax", secondary.clone());
    }
    gw
}

fn reasoning() -> GenerateParams {
    GenerateParams::new(TaskType::Reasoning, "You are a transit assistant.", "Plan Narita to Asakusa")
}

#[tokio::test]
async fn primary_success_is_sanitized() {
    let hub = ScriptedProvider::new("hub", vec![Step::Reply("[THINKING]plan[/THINKING]\n Take the Keisei line. ")]);
    let gw = gateway(&hub, None);

    let text = gw.generate_response(reasoning()).await;

    assert_eq!(text.as_deref(), Some("Take the Keisei line."));
    let requests = hub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gemini-3-flash-preview");
    assert_eq!(requests[0].timeout, Duration::from_secs(90));
    assert_eq!(requests[0].max_tokens, 600);
}

#[tokio::test]
async fn explicit_token_budget_reaches_provider() {
    let hub = ScriptedProvider::new("hub", vec![Step::Reply("ok")]);
    let gw = gateway(&hub, None);

    gw.generate_response(reasoning().with_max_tokens(1500).with_temperature(0.9)).await;

    let request = &hub.requests()[0];
    assert_eq!(request.max_tokens, 1500);
    assert_eq!(request.temperature, 0.9);
}

#[tokio::test]
async fn reasoning_failure_falls_back_to_secondary_once() {
    let hub = ScriptedProvider::new("hub", vec![Step::Fail]);
    let minimax = ScriptedProvider::new("minimax", vec![Step::Reply("Fallback plan.")]);
    let gw = gateway(&hub, Some(&minimax));

    let text = gw.generate_response(reasoning()).await;

    assert_eq!(text.as_deref(), Some("Fallback plan."));
    assert_eq!(hub.requests().len(), 1);
    let secondary = minimax.requests();
    assert_eq!(secondary.len(), 1);
    assert_eq!(secondary[0].model, "MiniMax-M2.1");
}

#[tokio::test]
async fn no_secondary_credential_means_no_fallback() {
    let hub = ScriptedProvider::new("hub", vec![Step::Fail]);
    let gw = gateway(&hub, None);

    assert!(gw.generate_response(reasoning()).await.is_none());
    assert_eq!(hub.requests().len(), 1);
}

#[tokio::test]
async fn chat_failure_does_not_use_secondary() {
    let hub = ScriptedProvider::new("hub", vec![Step::Fail]);
    let minimax = ScriptedProvider::new("minimax", vec![Step::Reply("unused")]);
    let gw = gateway(&hub, Some(&minimax));

    let params = GenerateParams::new(TaskType::Chat, "s", "Tell me about Kyoto");
    assert!(gw.generate_response(params).await.is_none());
    assert!(minimax.requests().is_empty());
}

#[tokio::test]
async fn secondary_failure_returns_none() {
    let hub = ScriptedProvider::new("hub", vec![Step::Fail]);
    let minimax = ScriptedProvider::new("minimax", vec![Step::Fail]);
    let gw = gateway(&hub, Some(&minimax));

    assert!(gw.generate_response(reasoning()).await.is_none());
    assert_eq!(minimax.requests().len(), 1);
}

#[tokio::test]
async fn rate_limit_downgrades_to_cheapest_model_once() {
    let hub = ScriptedProvider::new("hub", vec![Step::RateLimit, Step::Reply("Lite answer.")]);
    let gw = gateway(&hub, None);

    let params = GenerateParams::new(TaskType::Chat, "s", "What is a Suica card?");
    let text = gw.generate_response(params).await;

    assert_eq!(text.as_deref(), Some("Lite answer."));
    let models: Vec<String> = hub.requests().into_iter().map(|r| r.model).collect();
    assert_eq!(models, ["deepseek-v3.2", "gemini-2.5-flash-lite"]);
}

#[tokio::test]
async fn rate_limit_on_cheapest_model_is_not_retried() {
    let hub = ScriptedProvider::new("hub", vec![Step::RateLimit, Step::Reply("unused")]);
    let gw = gateway(&hub, None);

    let params = GenerateParams::new(TaskType::Classification, "s", "hello");
    assert!(gw.generate_response(params).await.is_none());
    assert_eq!(hub.requests().len(), 1);
}

#[tokio::test]
async fn rate_limit_on_secondary_override_is_not_downgraded() {
    let hub = ScriptedProvider::new("hub", vec![Step::RateLimit]);
    let minimax = ScriptedProvider::new("minimax", vec![Step::RateLimit, Step::Reply("unused")]);
    let gw = gateway(&hub, Some(&minimax));

    let params = GenerateParams::new(TaskType::Chat, "s", "u").with_model("MiniMax-M2.1");
    assert!(gw.generate_response(params).await.is_none());

    let models: Vec<String> = minimax.requests().into_iter().map(|r| r.model).collect();
    assert_eq!(models, ["MiniMax-M2.1"]);
    assert!(hub.requests().is_empty());
}

#[tokio::test]
async fn rate_limit_on_hub_override_still_downgrades() {
    let hub = ScriptedProvider::new("hub", vec![Step::RateLimit, Step::Reply("Lite.")]);
    let gw = gateway(&hub, None);

    let params = GenerateParams::new(TaskType::Chat, "s", "u").with_model("gpt-4o");
    assert_eq!(gw.generate_response(params).await.as_deref(), Some("Lite."));

    let models: Vec<String> = hub.requests().into_iter().map(|r| r.model).collect();
    assert_eq!(models, ["gpt-4o", "gemini-2.5-flash-lite"]);
}

#[tokio::test]
async fn downgrade_can_be_disabled_per_task() {
    let mut config = GatewayConfig::default();
    config.policies.insert(
        TaskType::Chat,
        PolicyOverride {
            allow_downgrade: Some(false),
            ..Default::default()
        },
    );
    let hub = ScriptedProvider::new("hub", vec![Step::RateLimit, Step::Reply("unused")]);
    let gw = ModelGateway::new(&config).with_provider("hub", hub.clone());

    let params = GenerateParams::new(TaskType::Chat, "s", "u");
    assert!(gw.generate_response(params).await.is_none());
    assert_eq!(hub.requests().len(), 1);
}

#[tokio::test]
async fn rate_limited_downgrade_failure_still_reaches_secondary() {
    let hub = ScriptedProvider::new("hub", vec![Step::RateLimit, Step::RateLimit]);
    let minimax = ScriptedProvider::new("minimax", vec![Step::Reply("Secondary.")]);
    let gw = gateway(&hub, Some(&minimax));

    let text = gw.generate_response(reasoning()).await;

    assert_eq!(text.as_deref(), Some("Secondary."));
    assert_eq!(hub.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn hanging_provider_returns_none_within_budget() {
    let hub = ScriptedProvider::new("hub", vec![Step::Hang]);
    let gw = gateway(&hub, None);

    let started = tokio::time::Instant::now();
    let text = gw.generate_response(GenerateParams::new(TaskType::Simple, "s", "hi")).await;

    assert!(text.is_none());
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(15) && elapsed < Duration::from_secs(16));
}

#[tokio::test(start_paused = true)]
async fn hanging_primary_falls_back_after_its_budget() {
    let hub = ScriptedProvider::new("hub", vec![Step::Hang]);
    let minimax = ScriptedProvider::new("minimax", vec![Step::Reply("Recovered.")]);
    let gw = gateway(&hub, Some(&minimax));

    let started = tokio::time::Instant::now();
    let text = gw.generate_response(reasoning()).await;

    assert_eq!(text.as_deref(), Some("Recovered."));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(90) && elapsed < Duration::from_secs(91));
}

#[tokio::test]
async fn busy_notice_counts_as_failure() {
    let hub = ScriptedProvider::new("hub", vec![Step::Reply("抱歉，目前系統繁忙，請稍後再試。")]);
    let minimax = ScriptedProvider::new("minimax", vec![Step::Reply("Here is your route.")]);
    let gw = gateway(&hub, Some(&minimax));

    let text = gw.generate_response(reasoning()).await;

    assert_eq!(text.as_deref(), Some("Here is your route."));
}

#[tokio::test]
async fn scratch_only_output_counts_as_failure() {
    let hub = ScriptedProvider::new("hub", vec![Step::Reply("<think>nothing to say</think>")]);
    let gw = gateway(&hub, None);

    let params = GenerateParams::new(TaskType::Simple, "s", "hi");
    assert!(gw.generate_response(params).await.is_none());
}

#[tokio::test]
async fn override_routes_to_named_provider_without_secondary_fallback() {
    let hub = ScriptedProvider::new("hub", vec![Step::Reply("unused")]);
    let minimax = ScriptedProvider::new("minimax", vec![Step::Fail]);
    let gw = gateway(&hub, Some(&minimax));

    let params = reasoning().with_model("minimax-m2.1");
    assert!(gw.generate_response(params).await.is_none());

    assert!(hub.requests().is_empty());
    let requests = minimax.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "minimax-m2.1");
    assert_eq!(requests[0].timeout, Duration::from_secs(90));
}

#[tokio::test]
async fn missing_primary_returns_none() {
    let gw = ModelGateway::new(&GatewayConfig::default());
    assert!(gw.generate_response(reasoning()).await.is_none());
}
