// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end cascade testing.
//!
//! `TestHarness` assembles a complete [`CascadePipeline`] over mock
//! adapters, with fresh cache and breaker registries per harness. Provides
//! `ask()` and `send()` to drive the full cascade in tests.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use waypoint_agent::{
    breaker_config, CascadePipeline, CascadeRequest, CascadeResponse, GuardedStrategy,
    transition_observer, StrategyProvider, STRATEGY_BREAKER,
};
use waypoint_cache::CacheRegistry;
use waypoint_config::WaypointConfig;
use waypoint_core::{Locale, WaypointError};
use waypoint_resilience::{BreakerRegistry, CircuitBreaker};
use waypoint_tools::{Tool, ToolRegistry};

use crate::mock_generator::MockGenerator;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: WaypointConfig,
    generator: Option<MockGenerator>,
    tools: Vec<Arc<dyn Tool>>,
    strategy: Option<Arc<dyn StrategyProvider>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: WaypointConfig::default(),
            generator: None,
            tools: Vec::new(),
            strategy: None,
        }
    }

    /// Replace the default configuration.
    pub fn with_config(mut self, config: WaypointConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the scripted generator (defaults to [`MockGenerator::new`]).
    pub fn with_generator(mut self, generator: MockGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Register a tool.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Attach a strategy provider behind the `strategy_engine` breaker.
    pub fn with_strategy(mut self, strategy: Arc<dyn StrategyProvider>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub fn build(self) -> Result<TestHarness, WaypointError> {
        let generator = Arc::new(self.generator.unwrap_or_default());
        let caches = Arc::new(CacheRegistry::new());
        let mut breakers = BreakerRegistry::new(breaker_config(&self.config.breaker));
        if let Some(observer) = transition_observer() {
            breakers = breakers.with_observer(observer);
        }
        let breakers = Arc::new(breakers);

        let mut tools = ToolRegistry::new();
        for tool in self.tools {
            tools.register(tool);
        }

        let mut pipeline =
            CascadePipeline::from_config(&self.config, &caches, tools, generator.clone())?;
        if let Some(provider) = self.strategy {
            let breaker =
                breakers.get_or_create(STRATEGY_BREAKER, breaker_config(&self.config.breaker));
            pipeline = pipeline.with_strategy(GuardedStrategy::new(provider, breaker));
        }

        Ok(TestHarness {
            pipeline: Arc::new(pipeline),
            generator,
            caches,
            breakers,
            config: self.config,
        })
    }
}

/// A fully assembled cascade over mock adapters.
pub struct TestHarness {
    pub pipeline: Arc<CascadePipeline>,
    pub generator: Arc<MockGenerator>,
    pub caches: Arc<CacheRegistry>,
    pub breakers: Arc<BreakerRegistry>,
    pub config: WaypointConfig,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Send `text` through the cascade with a fresh session and no cancellation.
    pub async fn ask(&self, text: &str, locale: Locale) -> CascadeResponse {
        self.send(CascadeRequest::new(text, locale)).await
    }

    /// Send a prepared request with no cancellation.
    pub async fn send(&self, request: CascadeRequest) -> CascadeResponse {
        self.pipeline
            .handle(request, &CancellationToken::new())
            .await
    }

    /// The breaker guarding strategy lookups.
    pub fn strategy_breaker(&self) -> Arc<CircuitBreaker> {
        self.breakers
            .get_or_create(STRATEGY_BREAKER, breaker_config(&self.config.breaker))
    }
}
