// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints serde cannot express: ratio ranges,
//! positive budgets, provider references, and gate regexes.

use crate::diagnostic::ConfigError;
use crate::model::{CacheSettings, WaypointConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &WaypointConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_cache("cache.classifier", &config.cache.classifier, &mut errors);
    validate_cache("cache.tool_router", &config.cache.tool_router, &mut errors);
    if config.cache.janitor_interval_ms == 0 {
        errors.push(validation("cache.janitor_interval_ms must be positive"));
    }

    if config.breaker.failure_threshold < 1 {
        errors.push(validation("breaker.failure_threshold must be at least 1"));
    }
    if config.breaker.half_open_success_threshold < 1 {
        errors.push(validation(
            "breaker.half_open_success_threshold must be at least 1",
        ));
    }
    if config.breaker.reset_timeout_ms == 0 {
        errors.push(validation("breaker.reset_timeout_ms must be positive"));
    }
    if config.breaker.call_timeout_ms == Some(0) {
        errors.push(validation("breaker.call_timeout_ms must be positive when set"));
    }

    for (name, provider) in &config.providers {
        if provider.base_url.trim().is_empty() {
            errors.push(validation(format!(
                "providers.{name}.base_url must not be empty"
            )));
        }
    }

    let gateway = &config.gateway;
    if !config.providers.contains_key(&gateway.primary_provider) {
        errors.push(validation(format!(
            "gateway.primary_provider `{}` is not defined under [providers]",
            gateway.primary_provider
        )));
    }
    if let Some(secondary) = &gateway.secondary_provider {
        if !config.providers.contains_key(secondary) {
            errors.push(validation(format!(
                "gateway.secondary_provider `{secondary}` is not defined under [providers]"
            )));
        }
    }
    if gateway.cheapest_model.trim().is_empty() {
        errors.push(validation("gateway.cheapest_model must not be empty"));
    }
    for (i, route) in gateway.model_routes.iter().enumerate() {
        if route.contains.trim().is_empty() {
            errors.push(validation(format!(
                "gateway.model_routes[{i}].contains must not be empty"
            )));
        }
        if !config.providers.contains_key(&route.provider) {
            errors.push(validation(format!(
                "gateway.model_routes[{i}].provider `{}` is not defined under [providers]",
                route.provider
            )));
        }
    }
    for (task, policy) in &gateway.policies {
        if policy.timeout_ms == Some(0) {
            errors.push(validation(format!(
                "gateway.policies.{task}.timeout_ms must be positive"
            )));
        }
        if policy.max_tokens == Some(0) {
            errors.push(validation(format!(
                "gateway.policies.{task}.max_tokens must be positive"
            )));
        }
    }

    if config.classifier.model_timeout_ms == 0 {
        errors.push(validation("classifier.model_timeout_ms must be positive"));
    }

    if config.tool_router.input_max_chars == 0 {
        errors.push(validation("tool_router.input_max_chars must be positive"));
    }
    for (i, gate) in config.tool_router.gates.iter().enumerate() {
        if let Err(e) = regex::Regex::new(&gate.signal) {
            errors.push(validation(format!(
                "tool_router.gates[{i}].signal is not a valid regex: {e}"
            )));
        }
        if let Some(unless) = &gate.unless {
            if let Err(e) = regex::Regex::new(unless) {
                errors.push(validation(format!(
                    "tool_router.gates[{i}].unless is not a valid regex: {e}"
                )));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_cache(section: &str, settings: &CacheSettings, errors: &mut Vec<ConfigError>) {
    if settings.max_size == 0 {
        errors.push(validation(format!("{section}.max_size must be at least 1")));
    }
    if settings.ttl_ms == 0 {
        errors.push(validation(format!("{section}.ttl_ms must be positive")));
    }
    if !(settings.eviction_ratio > 0.0 && settings.eviction_ratio <= 1.0) {
        errors.push(validation(format!(
            "{section}.eviction_ratio must be in (0, 1], got {}",
            settings.eviction_ratio
        )));
    }
    if settings.max_key_chars == 0 {
        errors.push(validation(format!("{section}.max_key_chars must be positive")));
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
