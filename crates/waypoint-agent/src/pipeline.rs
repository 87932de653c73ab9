// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request control flow through the cascade tiers.
//!
//! Order within a request: intent matcher, classifier, then tool router
//! and/or model gateway depending on the assigned level. A template hit
//! returns before anything else runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use waypoint_cache::CacheRegistry;
use waypoint_config::WaypointConfig;
use waypoint_core::{DecisionLevel, GenerateParams, Locale, ResponseGenerator, WaypointError};
use waypoint_intent::{default_templates, IntentMatcher};
use waypoint_router::{
    cache_config, CachedSelection, ClassificationResult, ClassificationSource,
    DecisionClassifier, ToolRouter, CLASSIFIER_NAMESPACE, TOOL_ROUTER_NAMESPACE,
};
use waypoint_tools::{ToolContext, ToolRegistry};

use crate::fallback::fallback_message;
use crate::strategy::GuardedStrategy;
use crate::telemetry;

/// One user message entering the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeRequest {
    pub text: String,
    pub locale: Locale,
    pub session_id: String,
    /// Station or area the user is at, used for strategy context.
    #[serde(default)]
    pub location: Option<String>,
}

impl CascadeRequest {
    /// A request with a fresh session id.
    pub fn new(text: impl Into<String>, locale: Locale) -> Self {
        Self {
            text: text.into(),
            locale,
            session_id: uuid::Uuid::new_v4().to_string(),
            location: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// The tier that produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadeSource {
    Template,
    Tool,
    Model,
    /// Every tier failed or the request was cancelled.
    Fallback,
}

impl CascadeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CascadeSource::Template => "template",
            CascadeSource::Tool => "tool",
            CascadeSource::Model => "model",
            CascadeSource::Fallback => "fallback",
        }
    }
}

/// The answer to a [`CascadeRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeResponse {
    pub source: CascadeSource,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Absent when the intent matcher answered before classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<DecisionLevel>,
    /// Stage notes, in execution order.
    pub trace: Vec<String>,
}

impl CascadeResponse {
    fn fallback(locale: Locale, level: Option<DecisionLevel>, trace: Vec<String>) -> Self {
        Self {
            source: CascadeSource::Fallback,
            content: fallback_message(locale).to_string(),
            data: None,
            level,
            trace,
        }
    }
}

struct ToolRun {
    name: String,
    data: Value,
}

/// Wires the cascade tiers together. Cheap to share behind an `Arc`.
pub struct CascadePipeline {
    matcher: Arc<IntentMatcher>,
    classifier: Arc<DecisionClassifier>,
    tool_router: Arc<ToolRouter>,
    tools: Arc<ToolRegistry>,
    generator: Arc<dyn ResponseGenerator>,
    strategy: Option<GuardedStrategy>,
}

impl CascadePipeline {
    pub fn new(
        matcher: Arc<IntentMatcher>,
        classifier: Arc<DecisionClassifier>,
        tool_router: Arc<ToolRouter>,
        tools: Arc<ToolRegistry>,
        generator: Arc<dyn ResponseGenerator>,
    ) -> Self {
        Self {
            matcher,
            classifier,
            tool_router,
            tools,
            generator,
            strategy: None,
        }
    }

    /// Builds every tier from configuration.
    ///
    /// The classifier and tool router caches are taken from `caches`, so
    /// pipelines built from one registry share them.
    pub fn from_config(
        config: &WaypointConfig,
        caches: &CacheRegistry,
        tools: ToolRegistry,
        generator: Arc<dyn ResponseGenerator>,
    ) -> Result<Self, WaypointError> {
        let matcher = IntentMatcher::new(default_templates()?, config.intent.fallback_locale)?;

        let classifier_cache = caches.get_cache::<ClassificationResult>(
            CLASSIFIER_NAMESPACE,
            cache_config(&config.cache.classifier),
        )?;
        let classifier = DecisionClassifier::new(config.classifier.clone(), classifier_cache)?
            .with_generator(generator.clone());

        let router_cache = caches.get_cache::<CachedSelection>(
            TOOL_ROUTER_NAMESPACE,
            cache_config(&config.cache.tool_router),
        )?;
        let tool_router =
            ToolRouter::new(&config.tool_router, router_cache)?.with_generator(generator.clone());

        info!(
            templates = matcher.templates().len(),
            tools = tools.len(),
            "cascade pipeline assembled"
        );

        Ok(Self::new(
            Arc::new(matcher),
            Arc::new(classifier),
            Arc::new(tool_router),
            Arc::new(tools),
            generator,
        ))
    }

    /// Consults `strategy` for context on complex requests that carry a location.
    pub fn with_strategy(mut self, strategy: GuardedStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn matcher(&self) -> &IntentMatcher {
        &self.matcher
    }

    pub fn classifier(&self) -> &DecisionClassifier {
        &self.classifier
    }

    pub fn tool_router(&self) -> &ToolRouter {
        &self.tool_router
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answers `request`. Never fails; total failure yields a localized fallback.
    ///
    /// Cancelling `cancel` drops every in-flight downstream call and returns
    /// a fallback response.
    pub async fn handle(&self, request: CascadeRequest, cancel: &CancellationToken) -> CascadeResponse {
        let response = if cancel.is_cancelled() {
            CascadeResponse::fallback(request.locale, None, vec!["cancelled".to_string()])
        } else {
            tokio::select! {
                biased;
                response = self.run(&request, cancel) => response,
                _ = cancel.cancelled() => {
                    info!(session_id = request.session_id.as_str(), "request cancelled");
                    CascadeResponse::fallback(request.locale, None, vec!["cancelled".to_string()])
                }
            }
        };
        telemetry::record_request(response.source);
        response
    }

    async fn run(&self, request: &CascadeRequest, cancel: &CancellationToken) -> CascadeResponse {
        let text = request.text.trim();
        let locale = request.locale;
        let mut trace = Vec::new();

        if text.is_empty() {
            trace.push("empty input".to_string());
            return CascadeResponse::fallback(locale, None, trace);
        }

        if let Some(hit) = self.matcher.match_intent(text, locale) {
            debug!(template = hit.template_id.as_str(), "answered by template");
            trace.push(format!("intent:{}", hit.template_id));
            return CascadeResponse {
                source: CascadeSource::Template,
                content: hit.response.content,
                data: hit.response.data,
                level: None,
                trace,
            };
        }
        trace.push("intent:miss".to_string());

        let classification = self.classifier.classify_intent(text).await;
        let level = classification.level;
        trace.push(format!(
            "classify:{level}:{}",
            source_label(classification.source)
        ));
        info!(
            session_id = request.session_id.as_str(),
            level = %level,
            confidence = classification.confidence,
            "classified request"
        );

        match level {
            DecisionLevel::Simple => {
                self.answer_with_model(request, level, None, None, trace)
                    .await
            }
            DecisionLevel::Medium => {
                if let Some(run) = self.run_tool(request, &mut trace).await {
                    return tool_response(run, level, trace);
                }
                self.answer_with_model(request, level, None, None, trace)
                    .await
            }
            DecisionLevel::Complex | DecisionLevel::DeepReasoning => {
                let tool = self.run_tool(request, &mut trace).await;
                let context = self.strategy_context(request, cancel, &mut trace).await;
                self.answer_with_model(request, level, tool, context, trace)
                    .await
            }
        }
    }

    async fn run_tool(&self, request: &CascadeRequest, trace: &mut Vec<String>) -> Option<ToolRun> {
        if self.tools.is_empty() {
            trace.push("tool:none_registered".to_string());
            return None;
        }

        let definitions = self.tools.definitions();
        let Some(selection) = self
            .tool_router
            .select_tool(&request.text, &definitions)
            .await
        else {
            trace.push("tool:none".to_string());
            return None;
        };

        let name = selection.tool_name;
        let context = ToolContext::new(request.session_id.clone(), request.locale);
        match self
            .tools
            .execute(&name, selection.parameters, &context)
            .await
        {
            Ok(outcome) if outcome.success => {
                debug!(tool = name.as_str(), "tool succeeded");
                trace.push(format!("tool:{name}"));
                Some(ToolRun {
                    data: outcome.data.unwrap_or(Value::Null),
                    name,
                })
            }
            Ok(outcome) => {
                warn!(
                    tool = name.as_str(),
                    error = outcome.error.as_deref().unwrap_or("unspecified"),
                    "tool reported failure"
                );
                trace.push(format!("tool:{name}:failed"));
                None
            }
            Err(e) => {
                warn!(tool = name.as_str(), error = %e, "tool execution failed");
                trace.push(format!("tool:{name}:failed"));
                None
            }
        }
    }

    async fn strategy_context(
        &self,
        request: &CascadeRequest,
        cancel: &CancellationToken,
        trace: &mut Vec<String>,
    ) -> Option<String> {
        let strategy = self.strategy.as_ref()?;
        let location = request
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())?;

        match strategy.fetch(location, request.locale, cancel).await {
            Ok(Some(context)) => {
                trace.push("strategy:ok".to_string());
                Some(context)
            }
            Ok(None) => {
                trace.push("strategy:empty".to_string());
                None
            }
            Err(WaypointError::CircuitOpen { name }) => {
                info!(breaker = name.as_str(), "strategy circuit open, skipping context");
                trace.push("strategy:circuit_open".to_string());
                None
            }
            Err(e) => {
                warn!(error = %e, "strategy context unavailable");
                trace.push("strategy:failed".to_string());
                None
            }
        }
    }

    async fn answer_with_model(
        &self,
        request: &CascadeRequest,
        level: DecisionLevel,
        tool: Option<ToolRun>,
        context: Option<String>,
        mut trace: Vec<String>,
    ) -> CascadeResponse {
        let task = level.task_type();
        let params = GenerateParams::new(
            task,
            system_prompt(request.locale),
            user_prompt(&request.text, tool.as_ref(), context.as_deref()),
        );

        match self.generator.generate_response(params).await {
            Some(content) => {
                trace.push(format!("model:{task}"));
                CascadeResponse {
                    source: CascadeSource::Model,
                    content,
                    data: tool.map(|run| run.data),
                    level: Some(level),
                    trace,
                }
            }
            None => {
                trace.push(format!("model:{task}:failed"));
                match tool {
                    Some(run) => {
                        warn!(tool = run.name.as_str(), "model unavailable, answering with tool output");
                        tool_response(run, level, trace)
                    }
                    None => {
                        error!(
                            session_id = request.session_id.as_str(),
                            level = %level,
                            "every tier failed, returning fallback message"
                        );
                        CascadeResponse::fallback(request.locale, Some(level), trace)
                    }
                }
            }
        }
    }
}

fn source_label(source: ClassificationSource) -> &'static str {
    match source {
        ClassificationSource::Keyword => "keyword",
        ClassificationSource::Model => "model",
        ClassificationSource::Fallback => "fallback",
        ClassificationSource::Cache => "cache",
    }
}

fn tool_response(run: ToolRun, level: DecisionLevel, trace: Vec<String>) -> CascadeResponse {
    let content = run
        .data
        .get("summary")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| run.data.to_string());
    CascadeResponse {
        source: CascadeSource::Tool,
        content,
        data: Some(run.data),
        level: Some(level),
        trace,
    }
}

fn system_prompt(locale: Locale) -> String {
    format!(
        "You are Waypoint, a Tokyo transit assistant. Reply in the language of locale `{locale}`. \
         Be concise and accurate, and say so when you are unsure."
    )
}

fn user_prompt(text: &str, tool: Option<&ToolRun>, context: Option<&str>) -> String {
    let mut prompt = text.trim().to_string();
    if let Some(run) = tool {
        prompt.push_str(&format!("\n\n[Tool result: {}]\n{}", run.name, run.data));
    }
    if let Some(context) = context {
        prompt.push_str(&format!("\n\n[Travel context]\n{context}"));
    }
    prompt
}
