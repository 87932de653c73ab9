// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Waypoint decision cascade.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use waypoint_core::{DecisionLevel, Locale, TaskType};

/// Top-level Waypoint configuration.
///
/// Every section is optional and defaults to the production values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WaypointConfig {
    /// Agent identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Per-namespace cache sizing.
    #[serde(default)]
    pub cache: CacheSection,

    /// Circuit breaker guarding the strategy-context dependency.
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Model provider endpoints, keyed by provider name.
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Model gateway routing policy.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Decision classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Tool router settings.
    #[serde(default)]
    pub tool_router: ToolRouterConfig,

    /// Intent matcher settings.
    #[serde(default)]
    pub intent: IntentConfig,
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            cache: CacheSection::default(),
            breaker: BreakerConfig::default(),
            providers: default_providers(),
            gateway: GatewayConfig::default(),
            classifier: ClassifierConfig::default(),
            tool_router: ToolRouterConfig::default(),
            intent: IntentConfig::default(),
        }
    }
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Locale used when a request carries none.
    #[serde(default)]
    pub default_locale: Locale,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            default_locale: Locale::default(),
        }
    }
}

fn default_agent_name() -> String {
    "waypoint".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Cache sizing for each namespace that keeps one.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    /// Classification results, keyed by normalized input.
    #[serde(default = "default_classifier_cache")]
    pub classifier: CacheSettings,

    /// Tool selections, keyed by clamped input plus candidate names.
    #[serde(default = "default_tool_router_cache")]
    pub tool_router: CacheSettings,

    /// How often the janitor purges expired entries, in milliseconds.
    #[serde(default = "default_janitor_interval_ms")]
    pub janitor_interval_ms: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            classifier: default_classifier_cache(),
            tool_router: default_tool_router_cache(),
            janitor_interval_ms: default_janitor_interval_ms(),
        }
    }
}

/// Size and lifetime limits for one cache namespace.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    pub max_size: usize,
    pub ttl_ms: u64,
    /// Fraction of `max_size` removed when the store overflows.
    #[serde(default = "default_eviction_ratio")]
    pub eviction_ratio: f64,
    /// Longest string field kept verbatim when deriving a key.
    #[serde(default = "default_max_key_chars")]
    pub max_key_chars: usize,
}

fn default_classifier_cache() -> CacheSettings {
    CacheSettings {
        max_size: 500,
        ttl_ms: 5 * 60 * 1000,
        eviction_ratio: default_eviction_ratio(),
        max_key_chars: default_max_key_chars(),
    }
}

fn default_tool_router_cache() -> CacheSettings {
    CacheSettings {
        max_size: 500,
        ttl_ms: 2 * 60 * 1000,
        eviction_ratio: default_eviction_ratio(),
        max_key_chars: default_max_key_chars(),
    }
}

fn default_eviction_ratio() -> f64 {
    0.1
}

fn default_max_key_chars() -> usize {
    600
}

fn default_janitor_interval_ms() -> u64 {
    60_000
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Cooldown before an open circuit admits a probe, in milliseconds.
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,

    /// Consecutive probe successes that close a half-open circuit.
    #[serde(default = "default_half_open_success_threshold")]
    pub half_open_success_threshold: u32,

    /// Optional per-call deadline; exceeding it counts as a failure.
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
            half_open_success_threshold: default_half_open_success_threshold(),
            call_timeout_ms: None,
        }
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_reset_timeout_ms() -> u64 {
    20_000
}

fn default_half_open_success_threshold() -> u32 {
    1
}

/// Wire protocol spoken by a provider endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI-compatible `/chat/completions`.
    Openai,
    /// Anthropic Messages API.
    Anthropic,
}

/// One model provider endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    /// Endpoint base URL, without the `/chat/completions` or `/messages` suffix.
    pub base_url: String,

    /// Inline API key. Takes precedence over `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// API version header (Anthropic only).
    #[serde(default)]
    pub api_version: Option<String>,
}

impl ProviderConfig {
    /// Resolves the API key from the inline value or the named environment variable.
    ///
    /// Returns `None` when neither yields a non-empty key.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_providers() -> BTreeMap<String, ProviderConfig> {
    let mut providers = BTreeMap::new();
    providers.insert(
        "hub".to_string(),
        ProviderConfig {
            kind: ProviderKind::Openai,
            base_url: "https://hnd1.aihub.zeabur.ai/v1".to_string(),
            api_key: None,
            api_key_env: Some("ZEABUR_API_KEY".to_string()),
            api_version: None,
        },
    );
    providers.insert(
        "minimax".to_string(),
        ProviderConfig {
            kind: ProviderKind::Openai,
            base_url: "https://api.minimax.io/v1".to_string(),
            api_key: None,
            api_key_env: Some("MINIMAX_API_KEY".to_string()),
            api_version: None,
        },
    );
    providers
}

/// Model gateway routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Provider serving every routing-table entry.
    #[serde(default = "default_primary_provider")]
    pub primary_provider: String,

    /// Provider used once when a reasoning task fails on the primary.
    #[serde(default = "default_secondary_provider")]
    pub secondary_provider: Option<String>,

    /// Model used by the secondary provider.
    #[serde(default = "default_secondary_model")]
    pub secondary_model: String,

    /// Cheapest model variant; target of rate-limit downgrades.
    #[serde(default = "default_cheapest_model")]
    pub cheapest_model: String,

    /// Per-task overrides of the built-in policy table.
    #[serde(default)]
    pub policies: BTreeMap<TaskType, PolicyOverride>,

    /// Substring rules routing explicit model overrides to a provider.
    #[serde(default = "default_model_routes")]
    pub model_routes: Vec<ModelRoute>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            primary_provider: default_primary_provider(),
            secondary_provider: default_secondary_provider(),
            secondary_model: default_secondary_model(),
            cheapest_model: default_cheapest_model(),
            policies: BTreeMap::new(),
            model_routes: default_model_routes(),
        }
    }
}

fn default_primary_provider() -> String {
    "hub".to_string()
}

fn default_secondary_provider() -> Option<String> {
    Some("minimax".to_string())
}

fn default_secondary_model() -> String {
    "MiniMax-M2.1".to_string()
}

fn default_cheapest_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_model_routes() -> Vec<ModelRoute> {
    [
        ("deepseek", "hub"),
        ("gpt", "hub"),
        ("gemini", "hub"),
        ("minimax", "minimax"),
    ]
    .into_iter()
    .map(|(contains, provider)| ModelRoute {
        contains: contains.to_string(),
        provider: provider.to_string(),
    })
    .collect()
}

/// Overrides for one entry of the routing table. Unset fields keep the built-in value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverride {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Whether a rate-limited call may retry on the cheapest model.
    #[serde(default)]
    pub allow_downgrade: Option<bool>,
    /// Model requested from the secondary provider when this task falls back.
    #[serde(default)]
    pub fallback_model: Option<String>,
}

/// Routes an explicit model override containing `contains` (case-insensitive) to `provider`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelRoute {
    pub contains: String,
    pub provider: String,
}

/// Decision classifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Ask the classification model when no rule group matches.
    #[serde(default = "default_true")]
    pub model_fallback: bool,

    /// Time budget for the classification model call, in milliseconds.
    #[serde(default = "default_classifier_timeout_ms")]
    pub model_timeout_ms: u64,

    /// Level returned when the model call fails or times out.
    #[serde(default = "default_fallback_level")]
    pub fallback_level: DecisionLevel,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_fallback: true,
            model_timeout_ms: default_classifier_timeout_ms(),
            fallback_level: default_fallback_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_classifier_timeout_ms() -> u64 {
    5_000
}

fn default_fallback_level() -> DecisionLevel {
    DecisionLevel::Complex
}

/// Tool router configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolRouterConfig {
    /// Input characters kept when building the cache key and the prompt.
    #[serde(default = "default_input_max_chars")]
    pub input_max_chars: usize,

    /// Regex gates evaluated before any model call, in order.
    #[serde(default = "default_gates")]
    pub gates: Vec<GateConfig>,
}

impl Default for ToolRouterConfig {
    fn default() -> Self {
        Self {
            input_max_chars: default_input_max_chars(),
            gates: default_gates(),
        }
    }
}

fn default_input_max_chars() -> usize {
    600
}

/// What a fired gate does to the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateActionConfig {
    /// Return "no tool" without calling the model.
    ShortCircuit,
    /// Remove the gated tool from the candidates.
    Suppress,
}

/// A regex gate. Fires when `signal` matches and `unless` does not.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    pub tool: String,
    pub signal: String,
    #[serde(default)]
    pub unless: Option<String>,
    pub action: GateActionConfig,
}

/// Saving-money talk that names no fare or ticket term needs no fare lookup.
pub const SAVE_MONEY_PATTERN: &str = r"(?i)(?:省錢|便宜|節省|budget|save money|cheap|低預算)";

/// Fare and ticket vocabulary.
pub const FARE_PATTERN: &str = r"(?i)(?:票價|車資|費用|多少錢|多少円|多少日幣|多少日元|jr\s*pass|suica|pasmo|ic\s*卡|ic\s*card|一日券|周遊券|定期券|回數券|折扣|優惠票|買票|購票|售票|ticket|fare|cost|price|pass)";

fn default_gates() -> Vec<GateConfig> {
    vec![GateConfig {
        tool: "search_fare_rules".to_string(),
        signal: SAVE_MONEY_PATTERN.to_string(),
        unless: Some(FARE_PATTERN.to_string()),
        action: GateActionConfig::ShortCircuit,
    }]
}

/// Intent matcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntentConfig {
    /// Locale used when a matched template has no response for the requested one.
    #[serde(default = "default_fallback_locale")]
    pub fallback_locale: Locale,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            fallback_locale: default_fallback_locale(),
        }
    }
}

fn default_fallback_locale() -> Locale {
    Locale::En
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_values() {
        let config = WaypointConfig::default();
        assert_eq!(config.agent.name, "waypoint");
        assert_eq!(config.cache.classifier.max_size, 500);
        assert_eq!(config.cache.classifier.ttl_ms, 300_000);
        assert_eq!(config.cache.tool_router.ttl_ms, 120_000);
        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.breaker.reset_timeout_ms, 20_000);
        assert_eq!(config.breaker.half_open_success_threshold, 1);
        assert_eq!(config.gateway.cheapest_model, "gemini-2.5-flash-lite");
        assert_eq!(config.classifier.fallback_level, DecisionLevel::Complex);
        assert_eq!(config.intent.fallback_locale, Locale::En);
        assert!(config.providers.contains_key("hub"));
        assert!(config.providers.contains_key("minimax"));
    }

    #[test]
    fn policy_overrides_keyed_by_task_type() {
        let toml_str = r#"
[gateway.policies.reasoning]
model = "gemini-3-pro"
timeout_ms = 120000

[gateway.policies.context_heavy]
max_tokens = 900
"#;
        let config: WaypointConfig = toml::from_str(toml_str).unwrap();
        let reasoning = &config.gateway.policies[&TaskType::Reasoning];
        assert_eq!(reasoning.model.as_deref(), Some("gemini-3-pro"));
        assert_eq!(reasoning.timeout_ms, Some(120_000));
        assert_eq!(
            config.gateway.policies[&TaskType::ContextHeavy].max_tokens,
            Some(900)
        );
    }

    #[test]
    fn unknown_task_type_key_is_rejected() {
        let toml_str = r#"
[gateway.policies.poetry]
model = "x"
"#;
        assert!(toml::from_str::<WaypointConfig>(toml_str).is_err());
    }

    #[test]
    fn inline_api_key_wins_over_env() {
        let provider = ProviderConfig {
            kind: ProviderKind::Openai,
            base_url: "http://localhost".into(),
            api_key: Some("inline".into()),
            api_key_env: Some("WAYPOINT_TEST_KEY_THAT_IS_NOT_SET".into()),
            api_version: None,
        };
        assert_eq!(provider.resolve_api_key().as_deref(), Some("inline"));
    }

    #[test]
    fn missing_key_resolves_to_none() {
        let provider = ProviderConfig {
            kind: ProviderKind::Anthropic,
            base_url: "http://localhost".into(),
            api_key: Some("  ".into()),
            api_key_env: Some("WAYPOINT_TEST_KEY_THAT_IS_NOT_SET".into()),
            api_version: None,
        };
        assert!(provider.resolve_api_key().is_none());
    }

    #[test]
    fn gates_deserialize() {
        let toml_str = r#"
[[tool_router.gates]]
tool = "check_luggage_storage"
signal = "(?i)hotel"
action = "suppress"
"#;
        let config: WaypointConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tool_router.gates.len(), 1);
        assert_eq!(config.tool_router.gates[0].action, GateActionConfig::Suppress);
        assert!(config.tool_router.gates[0].unless.is_none());
    }
}
