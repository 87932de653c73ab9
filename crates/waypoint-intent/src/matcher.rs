// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-trie then priority-ordered regex matching over a template set.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use waypoint_core::{Locale, WaypointError};

use crate::template::{Captures, MatchResponse, Template};
use crate::trie::KeywordTrie;

/// A successful match: the template that fired and its rendered response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentMatch {
    pub template_id: String,
    pub response: MatchResponse,
}

/// An optional accelerated matcher with the same contract as [`IntentMatcher::match_intent`].
///
/// It is consulted before the in-process path. When it reports itself
/// unavailable, errors, or returns nothing, matching continues in-process,
/// so plugging one in changes latency only.
pub trait NativeMatcher: Send + Sync {
    fn is_available(&self) -> bool;

    fn find(&self, text: &str, locale: Locale) -> Result<Option<IntentMatch>, WaypointError>;
}

/// Deterministic template matcher. Built once and shared read-only.
pub struct IntentMatcher {
    /// Sorted by descending priority; ties keep registration order.
    templates: Vec<Template>,
    trie: KeywordTrie,
    fallback_locale: Locale,
    native: Option<Arc<dyn NativeMatcher>>,
}

impl std::fmt::Debug for IntentMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentMatcher")
            .field("templates", &self.templates.len())
            .field("keywords", &self.trie.len())
            .field("fallback_locale", &self.fallback_locale)
            .field("native", &self.native.is_some())
            .finish()
    }
}

impl IntentMatcher {
    /// Builds the matcher and its keyword index.
    ///
    /// Every template must have a response in `fallback_locale`, and template
    /// ids must be unique.
    pub fn new(templates: Vec<Template>, fallback_locale: Locale) -> Result<Self, WaypointError> {
        let mut seen = HashSet::new();
        for template in &templates {
            if !seen.insert(template.id().to_string()) {
                return Err(WaypointError::Config(format!(
                    "duplicate template id `{}`",
                    template.id()
                )));
            }
            if !template.has_locale(fallback_locale) {
                return Err(WaypointError::Config(format!(
                    "template `{}` has no `{fallback_locale}` response",
                    template.id()
                )));
            }
        }

        let mut templates = templates;
        // sort_by is stable
        templates.sort_by(|a, b| b.priority().cmp(&a.priority()));

        let mut trie = KeywordTrie::new();
        for template in &templates {
            for keyword in template.keywords() {
                if !trie.insert(keyword, template.id()) {
                    debug!(
                        keyword = keyword.as_str(),
                        template = template.id(),
                        "keyword already indexed by a higher-priority template"
                    );
                }
            }
        }

        Ok(Self {
            templates,
            trie,
            fallback_locale,
            native: None,
        })
    }

    pub fn with_native(mut self, native: Arc<dyn NativeMatcher>) -> Self {
        self.native = Some(native);
        self
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn keyword_count(&self) -> usize {
        self.trie.len()
    }

    pub fn fallback_locale(&self) -> Locale {
        self.fallback_locale
    }

    /// Matches `text` against the template set.
    ///
    /// A miss returns `None` and is not an error.
    pub fn match_intent(&self, text: &str, locale: Locale) -> Option<IntentMatch> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(native) = &self.native {
            if native.is_available() {
                match native.find(trimmed, locale) {
                    Ok(Some(hit)) => return Some(hit),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "native matcher failed, using in-process path"),
                }
            }
        }

        if let Some(id) = self.trie.lookup(trimmed) {
            if let Some(template) = self.templates.iter().find(|t| t.id() == id) {
                return Some(self.render(template, &Captures::whole(trimmed), locale));
            }
        }

        for template in &self.templates {
            for pattern in template.patterns() {
                if let Some(caps) = pattern.captures(trimmed) {
                    return Some(self.render(template, &Captures::from_regex(&caps), locale));
                }
            }
        }

        None
    }

    fn render(&self, template: &Template, captures: &Captures, locale: Locale) -> IntentMatch {
        // `new` guarantees the fallback locale is present.
        let response = template
            .response(locale)
            .or_else(|| template.response(self.fallback_locale))
            .map(|r| r.render(captures))
            .unwrap_or_else(|| MatchResponse::text(String::new()));
        IntentMatch {
            template_id: template.id().to_string(),
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::template::ResponseKind;

    fn templates() -> Vec<Template> {
        vec![
            Template::builder("low", 10)
                .pattern(r"(?i)station")
                .text(Locale::En, "low")
                .build()
                .unwrap(),
            Template::builder("high", 50)
                .pattern(r"(?i)station status")
                .keywords(["station status"])
                .text(Locale::En, "high")
                .text(Locale::Ja, "高")
                .build()
                .unwrap(),
            Template::builder("target", 30)
                .pattern(r"^go to (\w+)$")
                .computed(Locale::En, |caps| {
                    MatchResponse::action(
                        "navigating",
                        serde_json::json!({ "target": caps.group_or_whole(1) }),
                    )
                })
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn higher_priority_template_wins() {
        let matcher = IntentMatcher::new(templates(), Locale::En).unwrap();
        let hit = matcher.match_intent("is the station status ok", Locale::En).unwrap();
        assert_eq!(hit.template_id, "high");
        let hit = matcher.match_intent("which station", Locale::En).unwrap();
        assert_eq!(hit.template_id, "low");
    }

    #[test]
    fn trie_hit_on_trimmed_input() {
        let matcher = IntentMatcher::new(templates(), Locale::En).unwrap();
        let hit = matcher.match_intent("  Station Status \n", Locale::Ja).unwrap();
        assert_eq!(hit.template_id, "high");
        assert_eq!(hit.response.content, "高");
    }

    #[test]
    fn locale_falls_back() {
        let matcher = IntentMatcher::new(templates(), Locale::En).unwrap();
        let hit = matcher.match_intent("station", Locale::Ar).unwrap();
        assert_eq!(hit.response.content, "low");
    }

    #[test]
    fn computed_response_carries_data() {
        let matcher = IntentMatcher::new(templates(), Locale::En).unwrap();
        let hit = matcher.match_intent("go to Ueno", Locale::En).unwrap();
        assert_eq!(hit.response.kind, ResponseKind::Action);
        assert_eq!(hit.response.data, Some(serde_json::json!({ "target": "Ueno" })));
    }

    #[test]
    fn miss_and_blank_return_none() {
        let matcher = IntentMatcher::new(templates(), Locale::En).unwrap();
        assert!(matcher.match_intent("weather?", Locale::En).is_none());
        assert!(matcher.match_intent("   ", Locale::En).is_none());
    }

    #[test]
    fn rejects_duplicate_ids_and_missing_fallback() {
        let mut set = templates();
        set.push(
            Template::builder("low", 1)
                .pattern("x")
                .text(Locale::En, "dup")
                .build()
                .unwrap(),
        );
        assert!(IntentMatcher::new(set, Locale::En).is_err());
        assert!(IntentMatcher::new(templates(), Locale::Ja).is_err());
    }

    struct FlakyNative {
        calls: AtomicUsize,
        available: bool,
    }

    impl NativeMatcher for FlakyNative {
        fn is_available(&self) -> bool {
            self.available
        }

        fn find(&self, _text: &str, _locale: Locale) -> Result<Option<IntentMatch>, WaypointError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(WaypointError::Internal("native matcher crashed".into()))
        }
    }

    #[test]
    fn native_failure_does_not_change_result() {
        let plain = IntentMatcher::new(templates(), Locale::En).unwrap();
        let native = Arc::new(FlakyNative {
            calls: AtomicUsize::new(0),
            available: true,
        });
        let accelerated = IntentMatcher::new(templates(), Locale::En)
            .unwrap()
            .with_native(native.clone());

        for input in ["station status", "go to Ueno", "nothing here"] {
            assert_eq!(
                plain.match_intent(input, Locale::En),
                accelerated.match_intent(input, Locale::En)
            );
        }
        assert_eq!(native.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unavailable_native_is_skipped() {
        let native = Arc::new(FlakyNative {
            calls: AtomicUsize::new(0),
            available: false,
        });
        let matcher = IntentMatcher::new(templates(), Locale::En)
            .unwrap()
            .with_native(native.clone());
        assert!(matcher.match_intent("station", Locale::En).is_some());
        assert_eq!(native.calls.load(Ordering::SeqCst), 0);
    }
}
