// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool router behaviour against a scripted selection model.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::json;
use waypoint_cache::TtlCache;
use waypoint_config::model::{GateActionConfig, GateConfig, ToolRouterConfig};
use waypoint_core::{GenerateParams, ResponseGenerator, TaskType, ToolDefinition};
use waypoint_router::{ToolRouter, cache_config};

/// Replays queued replies; `None` entries simulate a failed model call.
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
    last_system_prompt: Mutex<String>,
}

impl ScriptedModel {
    fn with(replies: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.map(str::to_string)).collect()),
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResponseGenerator for ScriptedModel {
    async fn generate_response(&self, params: GenerateParams) -> Option<String> {
        assert_eq!(params.task_type, TaskType::Classification);
        assert_eq!(params.temperature, Some(0.0));
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_system_prompt.lock().unwrap() = params.system_prompt;
        self.replies.lock().unwrap().pop_front().flatten()
    }
}

fn tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new("search_fare_rules", "Ticket and fare rules", json!({"type": "object"})),
        ToolDefinition::new("find_route", "Route planning", json!({"type": "object"})),
        ToolDefinition::new("station_facilities", "Lockers, lifts, toilets", json!({"type": "object"})),
    ]
}

fn router(config: &ToolRouterConfig, model: Arc<ScriptedModel>) -> ToolRouter {
    let settings = waypoint_config::WaypointConfig::default().cache.tool_router;
    let cache = Arc::new(TtlCache::new("agent_router", cache_config(&settings)));
    ToolRouter::new(config, cache).unwrap().with_generator(model)
}

#[tokio::test]
async fn valid_selection_is_returned_and_cached() {
    let model = ScriptedModel::with(&[Some(
        r#"{"toolName":"find_route","reasoning":"directions","parameters":{"to":"Haneda"}}"#,
    )]);
    let r = router(&ToolRouterConfig::default(), model.clone());

    let first = r.select_tool("how do I get to Haneda", &tools()).await.unwrap();
    assert_eq!(first.tool_name, "find_route");
    let second = r.select_tool("  how do I get to Haneda  ", &tools()).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn foreign_tool_is_cached_as_no_tool() {
    let model = ScriptedModel::with(&[Some(r#"{"toolName":"delete_database","parameters":{}}"#)]);
    let r = router(&ToolRouterConfig::default(), model.clone());

    assert!(r.select_tool("where is the locker", &tools()).await.is_none());
    assert!(r.select_tool("where is the locker", &tools()).await.is_none());
    assert_eq!(model.calls(), 1, "negative result must be cached");
}

#[tokio::test]
async fn literal_null_is_cached() {
    let model = ScriptedModel::with(&[Some("```\nnull\n```")]);
    let r = router(&ToolRouterConfig::default(), model.clone());
    assert!(r.select_tool("tell me a joke", &tools()).await.is_none());
    assert!(r.select_tool("tell me a joke", &tools()).await.is_none());
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn failed_model_call_is_not_cached() {
    let model = ScriptedModel::with(&[None, Some(r#"{"toolName":"find_route"}"#)]);
    let r = router(&ToolRouterConfig::default(), model.clone());
    assert!(r.select_tool("route to Ueno", &tools()).await.is_none());
    let retry = r.select_tool("route to Ueno", &tools()).await.unwrap();
    assert_eq!(retry.tool_name, "find_route");
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn save_money_without_fare_terms_skips_the_model() {
    let model = ScriptedModel::with(&[]);
    let r = router(&ToolRouterConfig::default(), model.clone());
    assert!(r.select_tool("any tips to save money in Tokyo?", &tools()).await.is_none());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn suppress_gate_removes_tool_from_prompt_and_key() {
    let config = ToolRouterConfig {
        input_max_chars: 600,
        gates: vec![GateConfig {
            tool: "search_fare_rules".to_string(),
            signal: waypoint_config::model::SAVE_MONEY_PATTERN.to_string(),
            unless: Some(waypoint_config::model::FARE_PATTERN.to_string()),
            action: GateActionConfig::Suppress,
        }],
    };
    let model = ScriptedModel::with(&[Some(
        r#"{"toolName":"search_fare_rules","parameters":{}}"#,
    )]);
    let r = router(&config, model.clone());

    assert!(r.select_tool("cheap ways around Tokyo", &tools()).await.is_none());
    let prompt = model.last_system_prompt.lock().unwrap().clone();
    assert!(!prompt.contains("search_fare_rules"));
    assert!(prompt.contains("find_route"));
}

#[tokio::test]
async fn changing_the_tool_set_changes_the_key() {
    let model = ScriptedModel::with(&[
        Some(r#"{"toolName":"find_route"}"#),
        Some(r#"{"toolName":"station_facilities"}"#),
    ]);
    let r = router(&ToolRouterConfig::default(), model.clone());

    let mut reversed = tools();
    reversed.reverse();
    assert_eq!(r.select_tool("Ueno", &tools()).await.unwrap().tool_name, "find_route");
    assert_eq!(r.select_tool("Ueno", &reversed).await.unwrap().tool_name, "find_route");
    assert_eq!(model.calls(), 1, "tool order does not matter");

    let fewer = tools()[1..].to_vec();
    let picked = r.select_tool("Ueno", &fewer).await.unwrap();
    assert_eq!(picked.tool_name, "station_facilities");
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn empty_candidates_skip_the_model() {
    let model = ScriptedModel::with(&[]);
    let r = router(&ToolRouterConfig::default(), model.clone());
    assert!(r.select_tool("route to Ueno", &[]).await.is_none());
    assert!(r.select_tool("   ", &tools()).await.is_none());
    assert_eq!(model.calls(), 0);
}

proptest! {
    #[test]
    fn never_returns_a_tool_outside_the_candidates(
        reply in prop_oneof![
            "\\PC{0,40}",
            "[a-z_]{1,20}".prop_map(|name| format!(r#"{{"toolName":"{name}","parameters":{{}}}}"#)),
            Just("null".to_string()),
        ],
        input in "[a-zA-Z ]{1,30}",
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        let offered = tools();
        let model = ScriptedModel::with(&[Some(reply.as_str())]);
        let selected = runtime.block_on(async {
            router(&ToolRouterConfig::default(), model).select_tool(&input, &offered).await
        });
        if let Some(selection) = selected {
            prop_assert!(offered.iter().any(|t| t.name == selection.tool_name));
        }
    }
}
