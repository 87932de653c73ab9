// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic cache key derivation.

use serde_json::{Map, Value};

/// Derives a cache key from a namespace and an argument object.
///
/// Strings are clamped to `max_chars` characters, arrays are sorted, object
/// keys are ordered, and null fields are dropped, so that semantically
/// identical calls share a key regardless of argument order or trailing input.
pub fn generate_key(namespace: &str, params: &Value, max_chars: usize) -> String {
    let canonical = canonicalize(params, max_chars);
    format!("{namespace}:{canonical}")
}

fn canonicalize(value: &Value, max_chars: usize) -> Value {
    match value {
        Value::String(s) => Value::String(clamp(s, max_chars)),
        Value::Array(items) => {
            let mut items: Vec<Value> = items
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| canonicalize(v, max_chars))
                .collect();
            items.sort_by_cached_key(|v| v.to_string());
            Value::Array(items)
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for k in keys {
                let v = &map[k];
                if !v.is_null() {
                    out.insert(k.clone(), canonicalize(v, max_chars));
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Keeps at most `max_chars` characters, never splitting a code point.
pub fn clamp(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
