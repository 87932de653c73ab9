// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic fast path of the cascade.
//!
//! [`IntentMatcher`] answers an input from a fixed template set without any
//! model call: first by exact keyword lookup in a [`KeywordTrie`], then by
//! testing template regexes in descending priority order.

pub mod builtin;
pub mod matcher;
pub mod template;
pub mod trie;

pub use builtin::default_templates;
pub use matcher::{IntentMatch, IntentMatcher, NativeMatcher};
pub use template::{Captures, MatchResponse, ResponseKind, Template, TemplateResponse};
pub use trie::{KeywordTrie, TrieNode};
