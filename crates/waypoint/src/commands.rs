// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.

use serde::Serialize;
use tracing::debug;
use waypoint_agent::{install_signal_handler, CascadeRequest};
use waypoint_config::WaypointConfig;
use waypoint_core::{Locale, WaypointError};
use waypoint_intent::{default_templates, IntentMatcher};

use crate::runtime::Runtime;

fn print_json<T: Serialize>(value: &T) -> Result<(), WaypointError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| WaypointError::Internal(format!("failed to render output: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn resolve_locale(config: &WaypointConfig, tag: Option<&str>) -> Locale {
    tag.map(Locale::normalize).unwrap_or(config.agent.default_locale)
}

/// `waypoint ask`: runs one request through the cascade.
///
/// Ctrl-C cancels the in-flight request, which then answers with the
/// localized fallback message.
pub async fn run_ask(
    config: &WaypointConfig,
    text: &str,
    locale: Option<&str>,
) -> Result<(), WaypointError> {
    let shutdown = install_signal_handler();
    let runtime = Runtime::assemble(config, &shutdown)?;

    let request = CascadeRequest::new(text, resolve_locale(config, locale));
    let response = runtime.pipeline.handle(request, &shutdown).await;

    for stats in runtime.caches.all_stats() {
        debug!(
            namespace = stats.namespace.as_str(),
            hits = stats.hits,
            misses = stats.misses,
            "cache stats"
        );
    }
    shutdown.cancel();
    print_json(&response)
}

/// `waypoint classify`: prints the decision level for `text`.
pub async fn run_classify(config: &WaypointConfig, text: &str) -> Result<(), WaypointError> {
    let shutdown = install_signal_handler();
    let runtime = Runtime::assemble(config, &shutdown)?;
    let result = runtime.pipeline.classifier().classify_intent(text).await;
    shutdown.cancel();
    print_json(&result)
}

/// `waypoint match`: tries the templates alone. Never touches the network.
pub fn run_match(config: &WaypointConfig, text: &str, locale: Option<&str>) -> Result<(), WaypointError> {
    let matcher = IntentMatcher::new(default_templates()?, config.intent.fallback_locale)?;
    match matcher.match_intent(text, resolve_locale(config, locale)) {
        Some(hit) => print_json(&hit),
        None => {
            println!("no template matched");
            Ok(())
        }
    }
}

/// `waypoint config check`: reports the validated configuration.
pub fn run_config_check(config: &WaypointConfig) {
    println!("configuration OK (agent.name={})", config.agent.name);
    println!("primary provider: {}", config.gateway.primary_provider);
    if let Some(secondary) = &config.gateway.secondary_provider {
        println!("secondary provider: {secondary}");
    }
    for (name, provider) in &config.providers {
        let credential = if provider.resolve_api_key().is_some() {
            "credential found"
        } else {
            "no credential"
        };
        println!("  [{name}] {:?} {} ({credential})", provider.kind, provider.base_url);
    }
}
