// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-backed tool selection.
//!
//! Local regex gates run before any model call. The model is then shown the
//! remaining tool schemas and must answer with one strict JSON object or the
//! literal `null`. Any answer naming a tool outside the candidate set, or
//! failing to parse, becomes "no tool" and is cached as such.

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};
use waypoint_cache::key::clamp;
use waypoint_cache::{CacheStats, TtlCache};
use waypoint_config::model::{GateActionConfig, ToolRouterConfig};
use waypoint_core::{GenerateParams, ResponseGenerator, TaskType, ToolDefinition, ToolSelection, WaypointError};

use crate::output::strip_code_fences;

/// What a fired gate does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Answer "no tool" without calling the model.
    ShortCircuit,
    /// Remove the gated tool from the candidates.
    Suppress,
}

impl From<GateActionConfig> for GateAction {
    fn from(action: GateActionConfig) -> Self {
        match action {
            GateActionConfig::ShortCircuit => GateAction::ShortCircuit,
            GateActionConfig::Suppress => GateAction::Suppress,
        }
    }
}

/// A local pre-filter. Fires when `signal` matches and `unless` does not.
#[derive(Debug, Clone)]
pub struct ToolGate {
    pub tool: String,
    pub signal: Regex,
    pub unless: Option<Regex>,
    pub action: GateAction,
}

impl ToolGate {
    pub fn fires(&self, input: &str) -> bool {
        self.signal.is_match(input) && !self.unless.as_ref().is_some_and(|u| u.is_match(input))
    }
}

/// A cached routing outcome.
///
/// `NoTool` is a real answer ("nothing applies"), distinct from a cache miss.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedSelection {
    NoTool,
    Selected(ToolSelection),
}

impl CachedSelection {
    fn into_option(self) -> Option<ToolSelection> {
        match self {
            CachedSelection::NoTool => None,
            CachedSelection::Selected(selection) => Some(selection),
        }
    }
}

/// Selects at most one tool for an input.
pub struct ToolRouter {
    gates: Vec<ToolGate>,
    input_max_chars: usize,
    cache: Arc<TtlCache<CachedSelection>>,
    generator: Option<Arc<dyn ResponseGenerator>>,
}

impl ToolRouter {
    /// Compiles the configured gates.
    pub fn new(
        config: &ToolRouterConfig,
        cache: Arc<TtlCache<CachedSelection>>,
    ) -> Result<Self, WaypointError> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| WaypointError::Config(format!("invalid tool gate pattern: {e}")))
        };
        let gates = config
            .gates
            .iter()
            .map(|gate| {
                Ok(ToolGate {
                    tool: gate.tool.clone(),
                    signal: compile(&gate.signal)?,
                    unless: gate.unless.as_deref().map(compile).transpose()?,
                    action: gate.action.into(),
                })
            })
            .collect::<Result<Vec<_>, WaypointError>>()?;

        Ok(Self {
            gates,
            input_max_chars: config.input_max_chars,
            cache,
            generator: None,
        })
    }

    pub fn with_generator(mut self, generator: Arc<dyn ResponseGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn gates(&self) -> &[ToolGate] {
        &self.gates
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Picks a tool from `tools` for `input`, or `None`.
    ///
    /// The returned `tool_name` is always the name of one of `tools`.
    pub async fn select_tool(&self, input: &str, tools: &[ToolDefinition]) -> Option<ToolSelection> {
        let input = clamp(input.trim(), self.input_max_chars);
        if input.is_empty() {
            return None;
        }

        let mut candidates: Vec<&ToolDefinition> = tools.iter().collect();
        for gate in self.gates.iter().filter(|g| g.fires(&input)) {
            match gate.action {
                GateAction::ShortCircuit => {
                    debug!(gate = %gate.tool, "tool gate short-circuited routing");
                    return None;
                }
                GateAction::Suppress => {
                    debug!(gate = %gate.tool, "tool gate suppressed candidate");
                    candidates.retain(|t| t.name != gate.tool);
                }
            }
        }
        if candidates.is_empty() {
            return None;
        }

        let key = self.cache_key(&input, &candidates);
        if let Some(cached) = self.cache.get(&key) {
            return cached.into_option();
        }

        let generator = self.generator.as_ref()?;
        let params = GenerateParams::new(TaskType::Classification, system_prompt(&candidates), input.clone())
            .with_temperature(0.0);
        // A missing reply is a transport failure, not an answer; leave it uncached.
        let raw = generator.generate_response(params).await?;

        let outcome = match interpret(&raw, &candidates) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "discarding tool selection");
                CachedSelection::NoTool
            }
        };
        self.cache.set(key, outcome.clone());
        outcome.into_option()
    }

    fn cache_key(&self, input: &str, candidates: &[&ToolDefinition]) -> String {
        let names: Vec<&str> = candidates.iter().map(|t| t.name.as_str()).collect();
        self.cache.key(&serde_json::json!({ "input": input, "tools": names }))
    }
}

fn system_prompt(candidates: &[&ToolDefinition]) -> String {
    let tools = candidates
        .iter()
        .filter_map(|t| serde_json::to_string(t).ok())
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You route requests for a transit assistant to the single most suitable tool.\n\n\
Available tools:\n{tools}\n\n\
Rules:\n\
1. Select a tool only if the input matches its capability.\n\
2. Extract the parameters the tool's schema asks for from the input.\n\
3. If no tool fits, or the user is chatting, reply with null.\n\
4. Only pick fare tools when the user asks about tickets, fares, passes or prices.\n\
5. Reply with one strict JSON object and no markdown:\n\
{{\"toolName\": \"name_of_the_tool\", \"reasoning\": \"why\", \"parameters\": {{}}}}"
    )
}

/// Validates a raw model reply against the candidate set.
fn interpret(raw: &str, candidates: &[&ToolDefinition]) -> Result<CachedSelection, WaypointError> {
    let cleaned = strip_code_fences(raw);
    if cleaned.eq_ignore_ascii_case("null") {
        return Ok(CachedSelection::NoTool);
    }

    let selection: ToolSelection = serde_json::from_str(&cleaned).map_err(|e| {
        WaypointError::ToolSelectionInvalid {
            reason: format!("unparsable reply: {e}"),
        }
    })?;

    if !candidates.iter().any(|t| t.name == selection.tool_name) {
        return Err(WaypointError::ToolSelectionInvalid {
            reason: format!("`{}` is not a candidate", selection.tool_name),
        });
    }
    if !selection.parameters.is_object() {
        return Err(WaypointError::ToolSelectionInvalid {
            reason: "parameters must be an object".to_string(),
        });
    }
    Ok(CachedSelection::Selected(selection))
}
