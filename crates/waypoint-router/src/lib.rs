// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decision classification and tool routing for the Waypoint cascade.
//!
//! This crate provides:
//! - [`DecisionClassifier`]: keyword rule groups ranked by signal specificity,
//!   with a bounded model fallback for inputs no rule recognizes
//! - [`ToolRouter`]: regex-gated, cached, model-backed tool selection that
//!   never returns a tool outside the candidate set

pub mod classifier;
mod output;
pub mod rules;
pub mod tool_router;

use std::time::Duration;

use waypoint_cache::CacheConfig;
use waypoint_config::model::CacheSettings;

pub use classifier::{ClassificationResult, ClassificationSource, DecisionClassifier};
pub use rules::{RuleGroup, RuleSet};
pub use tool_router::{CachedSelection, GateAction, ToolGate, ToolRouter};

/// Cache namespace for classification results.
pub const CLASSIFIER_NAMESPACE: &str = "intent";

/// Cache namespace for tool selections.
pub const TOOL_ROUTER_NAMESPACE: &str = "agent_router";

/// Converts configured cache limits into a store configuration.
pub fn cache_config(settings: &CacheSettings) -> CacheConfig {
    CacheConfig {
        max_size: settings.max_size,
        ttl: Duration::from_millis(settings.ttl_ms),
        eviction_ratio: settings.eviction_ratio,
        max_key_chars: settings.max_key_chars,
    }
}
