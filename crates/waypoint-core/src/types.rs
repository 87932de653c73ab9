// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the tiers of the decision cascade.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Tool,
    Observability,
}

/// A response locale.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum Locale {
    /// Traditional Chinese (Taiwan).
    #[default]
    #[strum(serialize = "zh-TW")]
    #[serde(rename = "zh-TW")]
    ZhTw,
    /// Simplified Chinese.
    #[strum(serialize = "zh")]
    #[serde(rename = "zh")]
    Zh,
    #[strum(serialize = "en")]
    #[serde(rename = "en")]
    En,
    #[strum(serialize = "ja")]
    #[serde(rename = "ja")]
    Ja,
    #[strum(serialize = "ar")]
    #[serde(rename = "ar")]
    Ar,
}

impl Locale {
    /// Every supported locale, in display order.
    pub const ALL: [Locale; 5] = [Locale::ZhTw, Locale::Zh, Locale::En, Locale::Ja, Locale::Ar];

    /// Maps a free-form locale tag (`ja-JP`, `en_US`, `zh-Hans`) onto a supported locale.
    ///
    /// Unknown or empty tags resolve to [`Locale::ZhTw`].
    pub fn normalize(tag: &str) -> Locale {
        let tag = tag.trim().to_ascii_lowercase().replace('_', "-");
        if tag.starts_with("ja") {
            Locale::Ja
        } else if tag.starts_with("en") {
            Locale::En
        } else if tag.starts_with("ar") {
            Locale::Ar
        } else if tag == "zh" || tag == "zh-cn" || tag == "zh-sg" || tag.starts_with("zh-hans") {
            Locale::Zh
        } else {
            Locale::ZhTw
        }
    }
}

/// The complexity tier assigned to an input. Ordered from cheapest to most expensive.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DecisionLevel {
    /// Social or single-fact input answerable by the cheapest model.
    Simple,
    /// A concrete lookup (route, fare, timetable) served by a tool.
    Medium,
    /// Needs tool output plus model reasoning.
    Complex,
    /// Multi-stop planning or open-ended judgement.
    DeepReasoning,
}

impl DecisionLevel {
    /// The model task type used when this level reaches the gateway.
    pub fn task_type(self) -> TaskType {
        match self {
            DecisionLevel::Simple => TaskType::Simple,
            DecisionLevel::Medium => TaskType::Chat,
            DecisionLevel::Complex => TaskType::Reasoning,
            DecisionLevel::DeepReasoning => TaskType::ContextHeavy,
        }
    }
}

/// The kind of work a model call performs. Drives provider, model and budget selection.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Classification,
    Simple,
    #[default]
    Reasoning,
    ContextHeavy,
    Synthesis,
    Chat,
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        TaskType::Classification,
        TaskType::Simple,
        TaskType::Reasoning,
        TaskType::ContextHeavy,
        TaskType::Synthesis,
        TaskType::Chat,
    ];

    /// Cheap, short-output tasks that always run on the fastest model.
    pub fn is_lightweight(self) -> bool {
        matches!(self, TaskType::Classification | TaskType::Simple)
    }

    /// Tasks eligible for the secondary-provider fallback.
    pub fn is_reasoning(self) -> bool {
        matches!(self, TaskType::Reasoning | TaskType::ContextHeavy)
    }
}

/// Caller-facing parameters for a model-backed response.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateParams {
    pub task_type: TaskType,
    pub system_prompt: String,
    pub user_prompt: String,
    /// Explicit model override. Bypasses the routing table.
    pub model: Option<String>,
    /// Explicit output budget. Only positive values are honoured.
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl GenerateParams {
    pub fn new(
        task_type: TaskType,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            task_type,
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A fully resolved request handed to a single provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// A tool as presented to the tool-selection model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool chosen by the router, with the parameters extracted from the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSelection {
    #[serde(rename = "toolName")]
    pub tool_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasoning: String,
    #[serde(default = "empty_parameters", deserialize_with = "null_as_empty_parameters")]
    pub parameters: serde_json::Value,
}

fn empty_parameters() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty_parameters<'de, D>(deserializer: D) -> Result<serde_json::Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<serde_json::Value>::deserialize(deserializer)?.unwrap_or_else(empty_parameters))
}
