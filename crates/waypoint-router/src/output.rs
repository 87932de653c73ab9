// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cleanup of model output before JSON parsing.

/// Removes markdown code fences (```` ```json ```` and ```` ``` ````) and surrounding whitespace.
pub(crate) fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}
