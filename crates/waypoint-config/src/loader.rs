// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./waypoint.toml` > `~/.config/waypoint/waypoint.toml` >
//! `/etc/waypoint/waypoint.toml` with environment variable overrides via `WAYPOINT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WaypointConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/waypoint/waypoint.toml`
/// 3. `~/.config/waypoint/waypoint.toml`
/// 4. `./waypoint.toml`
/// 5. `WAYPOINT_*` environment variables
pub fn load_config() -> Result<WaypointConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WaypointConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaypointConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WaypointConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaypointConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WaypointConfig::default()))
        .merge(Toml::file("/etc/waypoint/waypoint.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("waypoint/waypoint.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("waypoint.toml"))
        .merge(env_provider())
}

/// Environment provider with an explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `WAYPOINT_TOOL_ROUTER_INPUT_MAX_CHARS`
/// must become `tool_router.input_max_chars`.
fn env_provider() -> Env {
    Env::prefixed("WAYPOINT_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name onto a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: &[&str] = &[
        "tool_router",
        "agent",
        "breaker",
        "classifier",
        "gateway",
        "intent",
    ];

    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section) {
            if let Some(field) = rest.strip_prefix('_') {
                return format!("{section}.{field}");
            }
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("agent_name"), "agent.name");
        assert_eq!(map_env_key("agent_log_level"), "agent.log_level");
        assert_eq!(
            map_env_key("tool_router_input_max_chars"),
            "tool_router.input_max_chars"
        );
        assert_eq!(
            map_env_key("breaker_reset_timeout_ms"),
            "breaker.reset_timeout_ms"
        );
        assert_eq!(
            map_env_key("gateway_primary_provider"),
            "gateway.primary_provider"
        );
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("something"), "something");
    }
}
