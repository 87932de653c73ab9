// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tiered decision classification.
//!
//! Inputs are matched against keyword rule groups first (no network, no
//! latency). Only when no group recognizes the input is the classification
//! model asked, and that call is bounded by a timeout with a configured
//! fallback level.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use waypoint_cache::key::clamp;
use waypoint_cache::{CacheStats, TtlCache};
use waypoint_config::model::ClassifierConfig;
use waypoint_core::{DecisionLevel, GenerateParams, ResponseGenerator, TaskType, WaypointError};

use crate::output::strip_code_fences;
use crate::rules::RuleSet;

const SYSTEM_PROMPT: &str = "You are an intent classification expert for a transit assistant. \
Classify the user's input into one level:\n\
- simple: greetings, thanks, basic information, FAQ answerable from a template\n\
- medium: routes, fares, timetables or station facilities that need a lookup\n\
- complex: reasoning, multi-stop suggestions or situational judgement\n\
- deep_reasoning: multi-day or multi-stop itinerary planning\n\
Reply with JSON only, reason under ten words:\n\
{\"level\": \"simple|medium|complex|deep_reasoning\", \"confidence\": 0.0-1.0, \"reason\": \"...\"}";

/// Where a classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Keyword,
    Model,
    /// The model was unavailable or too slow.
    Fallback,
    Cache,
}

/// The outcome of classifying one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub level: DecisionLevel,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    pub reason: String,
    pub source: ClassificationSource,
    /// The model task type suited to this level.
    pub suggested_task: TaskType,
}

impl ClassificationResult {
    fn new(
        level: DecisionLevel,
        confidence: f32,
        reason: impl Into<String>,
        source: ClassificationSource,
    ) -> Self {
        Self {
            level,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
            source,
            suggested_task: level.task_type(),
        }
    }
}

#[derive(Deserialize)]
struct ModelVerdict {
    level: Option<String>,
    confidence: Option<f32>,
    reason: Option<String>,
}

/// Assigns a [`DecisionLevel`] to free text.
pub struct DecisionClassifier {
    rules: RuleSet,
    cache: Arc<TtlCache<ClassificationResult>>,
    generator: Option<Arc<dyn ResponseGenerator>>,
    config: ClassifierConfig,
}

impl DecisionClassifier {
    pub fn new(
        config: ClassifierConfig,
        cache: Arc<TtlCache<ClassificationResult>>,
    ) -> Result<Self, WaypointError> {
        Ok(Self {
            rules: RuleSet::builtin()?,
            cache,
            generator: None,
            config,
        })
    }

    /// Enables the model fallback for inputs no rule group recognizes.
    pub fn with_generator(mut self, generator: Arc<dyn ResponseGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Classifies `text`.
    ///
    /// Always returns within the configured model timeout; never fails.
    pub async fn classify_intent(&self, text: &str) -> ClassificationResult {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return ClassificationResult::new(
                DecisionLevel::Simple,
                1.0,
                "empty input",
                ClassificationSource::Keyword,
            );
        }

        let key = format!(
            "{}:{}",
            self.cache.namespace(),
            clamp(&normalized, self.cache.config().max_key_chars)
        );
        if let Some(mut hit) = self.cache.get(&key) {
            hit.source = ClassificationSource::Cache;
            return hit;
        }

        if let Some(group) = self.rules.best_match(&normalized) {
            debug!(group = group.name, level = %group.level, "classified by keyword");
            let result = ClassificationResult::new(
                group.level,
                group.confidence,
                format!("matched {} keywords", group.name),
                ClassificationSource::Keyword,
            );
            self.cache.set(key, result.clone());
            return result;
        }

        match self.ask_model(text.trim()).await {
            Some(result) => {
                self.cache.set(key, result.clone());
                result
            }
            None => ClassificationResult::new(
                self.config.fallback_level,
                0.5,
                "model classification unavailable",
                ClassificationSource::Fallback,
            ),
        }
    }

    /// Drops every cached classification.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn ask_model(&self, text: &str) -> Option<ClassificationResult> {
        if !self.config.model_fallback {
            return None;
        }
        let generator = self.generator.as_ref()?;

        let params = GenerateParams::new(
            TaskType::Classification,
            SYSTEM_PROMPT,
            format!("Classify this input:\n\"{text}\"\nReply with JSON only."),
        )
        .with_temperature(0.1);

        let budget = Duration::from_millis(self.config.model_timeout_ms);
        match tokio::time::timeout(budget, generator.generate_response(params)).await {
            Ok(Some(raw)) => Some(parse_verdict(&raw)),
            Ok(None) => {
                warn!("classification model returned nothing");
                None
            }
            Err(_) => {
                warn!(timeout_ms = self.config.model_timeout_ms, "classification model timed out");
                None
            }
        }
    }
}

fn parse_level(level: &str) -> DecisionLevel {
    match level.trim().to_lowercase().as_str() {
        "simple" => DecisionLevel::Simple,
        "medium" => DecisionLevel::Medium,
        "deep_reasoning" | "deep-reasoning" | "deepreasoning" => DecisionLevel::DeepReasoning,
        _ => DecisionLevel::Complex,
    }
}

/// Reads the model's verdict, falling back to a substring scan when the
/// output is not the requested JSON.
fn parse_verdict(raw: &str) -> ClassificationResult {
    let cleaned = strip_code_fences(raw);
    if let Ok(verdict) = serde_json::from_str::<ModelVerdict>(&cleaned) {
        let level = verdict
            .level
            .as_deref()
            .map(parse_level)
            .unwrap_or(DecisionLevel::Complex);
        return ClassificationResult::new(
            level,
            verdict.confidence.unwrap_or(0.7),
            verdict.reason.unwrap_or_else(|| "model classification".to_string()),
            ClassificationSource::Model,
        );
    }

    let lower = cleaned.to_lowercase();
    let (level, confidence) = if lower.contains("simple") {
        (DecisionLevel::Simple, 0.7)
    } else if lower.contains("medium") {
        (DecisionLevel::Medium, 0.7)
    } else if lower.contains("deep") {
        (DecisionLevel::DeepReasoning, 0.7)
    } else {
        (DecisionLevel::Complex, 0.6)
    };
    ClassificationResult::new(level, confidence, "unstructured model reply", ClassificationSource::Model)
}
