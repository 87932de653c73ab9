// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Removal of model scratch markup before text reaches a caller.

use std::sync::LazyLock;

use regex::Regex;

/// Reasoning blocks some models embed in their answer.
static SCRATCH_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?s)\[THINKING\].*?\[/THINKING\]").unwrap(),
        Regex::new(r"(?s)<think>.*?</think>").unwrap(),
    ]
});

/// Strips `[THINKING]...[/THINKING]` and `<think>...</think>` blocks and trims the rest.
pub fn sanitize_output(raw: &str) -> String {
    let mut text = raw.to_string();
    for pattern in SCRATCH_BLOCKS.iter() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    text.trim().to_string()
}
