// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Character trie mapping whole-input keywords to template ids.

use std::collections::HashMap;

/// One trie node: children keyed by character, plus a terminal marker.
#[derive(Debug, Default)]
pub struct TrieNode {
    children: HashMap<char, TrieNode>,
    /// Set when a keyword ends here; holds the owning template id.
    terminal: Option<String>,
}

impl TrieNode {
    pub fn child(&self, c: char) -> Option<&TrieNode> {
        self.children.get(&c)
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    pub fn template_id(&self) -> Option<&str> {
        self.terminal.as_deref()
    }
}

/// Case-insensitive exact-match index over template keywords.
///
/// Lookups walk one node per input character, so a miss or hit costs
/// O(length of input) regardless of how many keywords are stored.
#[derive(Debug, Default)]
pub struct KeywordTrie {
    root: TrieNode,
    len: usize,
}

impl KeywordTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `keyword` for `template_id`.
    ///
    /// Returns false and leaves the index unchanged if the keyword already
    /// belongs to a template; the first registration wins.
    pub fn insert(&mut self, keyword: &str, template_id: &str) -> bool {
        let mut node = &mut self.root;
        for c in keyword.trim().chars().flat_map(char::to_lowercase) {
            node = node.children.entry(c).or_default();
        }
        if node.terminal.is_some() {
            return false;
        }
        node.terminal = Some(template_id.to_string());
        self.len += 1;
        true
    }

    /// Returns the template id whose keyword equals `text` (case-insensitive).
    pub fn lookup(&self, text: &str) -> Option<&str> {
        let mut node = &self.root;
        for c in text.chars().flat_map(char::to_lowercase) {
            node = node.child(c)?;
        }
        node.template_id()
    }

    /// Number of indexed keywords.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
