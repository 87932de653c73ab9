// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-task routing policy: which model runs a task and how much it may spend.

use std::collections::HashMap;
use std::time::Duration;

use waypoint_config::model::{GatewayConfig, PolicyOverride};
use waypoint_core::TaskType;

/// Model, time and output budget for one task type.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPolicy {
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    /// A rate-limited call may retry once on the cheapest model.
    pub allow_downgrade: bool,
    /// Model requested from the secondary provider when the primary fails.
    pub fallback_model: Option<String>,
}

impl ModelPolicy {
    fn apply(&mut self, overrides: &PolicyOverride) {
        if let Some(model) = &overrides.model {
            self.model = model.clone();
        }
        if let Some(ms) = overrides.timeout_ms {
            self.timeout = Duration::from_millis(ms);
        }
        if let Some(max_tokens) = overrides.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(allow) = overrides.allow_downgrade {
            self.allow_downgrade = allow;
        }
        if let Some(model) = &overrides.fallback_model {
            self.fallback_model = Some(model.clone());
        }
    }
}

const LITE_MODEL: &str = "gemini-2.5-flash-lite";
const REASONING_MODEL: &str = "gemini-3-flash-preview";
const WRITING_MODEL: &str = "deepseek-v3.2";

/// Resolves a [`TaskType`] to its [`ModelPolicy`].
#[derive(Debug, Clone)]
pub struct PolicyTable {
    policies: HashMap<TaskType, ModelPolicy>,
}

impl PolicyTable {
    /// The production table.
    ///
    /// Classification and simple tasks run on the lite model with a short
    /// budget. Reasoning tasks get the most time and a secondary-provider
    /// fallback. Synthesis and chat get the largest output budget and a
    /// warmer temperature.
    pub fn builtin(secondary_model: &str) -> Self {
        let lite = ModelPolicy {
            model: LITE_MODEL.to_string(),
            timeout: Duration::from_secs(15),
            max_tokens: 200,
            temperature: 0.2,
            allow_downgrade: false,
            fallback_model: None,
        };
        let reasoning = ModelPolicy {
            model: REASONING_MODEL.to_string(),
            timeout: Duration::from_secs(90),
            max_tokens: 600,
            temperature: 0.2,
            allow_downgrade: true,
            fallback_model: Some(secondary_model.to_string()),
        };
        let writing = ModelPolicy {
            model: WRITING_MODEL.to_string(),
            timeout: Duration::from_secs(45),
            max_tokens: 700,
            temperature: 0.4,
            allow_downgrade: true,
            fallback_model: None,
        };

        let policies = TaskType::ALL
            .into_iter()
            .map(|task| {
                let policy = match task {
                    TaskType::Classification | TaskType::Simple => lite.clone(),
                    TaskType::Reasoning | TaskType::ContextHeavy => reasoning.clone(),
                    TaskType::Synthesis | TaskType::Chat => writing.clone(),
                };
                (task, policy)
            })
            .collect();
        Self { policies }
    }

    /// The production table with the `[gateway.policies]` overrides applied.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut table = Self::builtin(&config.secondary_model);
        for (task, overrides) in &config.policies {
            if let Some(policy) = table.policies.get_mut(task) {
                policy.apply(overrides);
            }
        }
        table
    }

    pub fn get(&self, task: TaskType) -> &ModelPolicy {
        // Every TaskType is inserted by `builtin`.
        &self.policies[&task]
    }

    /// Output budget for `task`; an explicit positive value takes precedence.
    pub fn max_tokens(&self, task: TaskType, requested: Option<u32>) -> u32 {
        requested
            .filter(|&n| n > 0)
            .unwrap_or_else(|| self.get(task).max_tokens)
    }
}
