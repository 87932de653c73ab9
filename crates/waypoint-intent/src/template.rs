// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent templates and their localized responses.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;
use waypoint_core::{Locale, WaypointError};

/// How the caller should present a matched response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Text,
    Card,
    /// The response asks the caller to perform a downstream action described in `data`.
    Action,
}

/// A response produced by a matched template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResponse {
    pub kind: ResponseKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl MatchResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Text,
            content: content.into(),
            data: None,
        }
    }

    pub fn action(content: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: ResponseKind::Action,
            content: content.into(),
            data: Some(data),
        }
    }
}

/// Owned capture groups of a template match. Group 0 is the whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    groups: Vec<Option<String>>,
}

impl Captures {
    pub(crate) fn from_regex(caps: &regex::Captures<'_>) -> Self {
        Self {
            groups: caps
                .iter()
                .map(|m| m.map(|m| m.as_str().to_string()))
                .collect(),
        }
    }

    /// Captures for a keyword hit: the whole input, no groups.
    pub(crate) fn whole(text: &str) -> Self {
        Self {
            groups: vec![Some(text.to_string())],
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    /// Group `index` if it participated, else the whole match.
    pub fn group_or_whole(&self, index: usize) -> &str {
        self.get(index).or_else(|| self.get(0)).unwrap_or_default()
    }
}

/// Builds a response from the capture groups of a match.
pub type ComputeFn = Arc<dyn Fn(&Captures) -> MatchResponse + Send + Sync>;

/// A template response: fixed text, or a function of the capture groups.
#[derive(Clone)]
pub enum TemplateResponse {
    Static(String),
    Computed(ComputeFn),
}

impl TemplateResponse {
    pub fn render(&self, captures: &Captures) -> MatchResponse {
        match self {
            TemplateResponse::Static(text) => MatchResponse::text(text.clone()),
            TemplateResponse::Computed(f) => f(captures),
        }
    }
}

impl fmt::Debug for TemplateResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateResponse::Static(text) => f.debug_tuple("Static").field(text).finish(),
            TemplateResponse::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// An intent template. Immutable once built.
#[derive(Debug, Clone)]
pub struct Template {
    id: String,
    priority: i32,
    patterns: Vec<Regex>,
    keywords: Vec<String>,
    responses: HashMap<Locale, TemplateResponse>,
}

impl Template {
    pub fn builder(id: impl Into<String>, priority: i32) -> TemplateBuilder {
        TemplateBuilder {
            id: id.into(),
            priority,
            patterns: Vec::new(),
            keywords: Vec::new(),
            responses: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn response(&self, locale: Locale) -> Option<&TemplateResponse> {
        self.responses.get(&locale)
    }

    pub fn has_locale(&self, locale: Locale) -> bool {
        self.responses.contains_key(&locale)
    }
}

/// Builder for [`Template`].
pub struct TemplateBuilder {
    id: String,
    priority: i32,
    patterns: Vec<String>,
    keywords: Vec<String>,
    responses: HashMap<Locale, TemplateResponse>,
}

impl TemplateBuilder {
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn text(mut self, locale: Locale, text: impl Into<String>) -> Self {
        self.responses
            .insert(locale, TemplateResponse::Static(text.into()));
        self
    }

    pub fn computed<F>(mut self, locale: Locale, f: F) -> Self
    where
        F: Fn(&Captures) -> MatchResponse + Send + Sync + 'static,
    {
        self.responses
            .insert(locale, TemplateResponse::Computed(Arc::new(f)));
        self
    }

    /// Compiles the patterns and checks the keyword index against them.
    ///
    /// When a template has patterns, every keyword must be matched by at
    /// least one of them, so the trie never answers an input the regex path
    /// would reject.
    pub fn build(self) -> Result<Template, WaypointError> {
        if self.responses.is_empty() {
            return Err(WaypointError::Config(format!(
                "template `{}` has no responses",
                self.id
            )));
        }

        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    WaypointError::Config(format!(
                        "template `{}` has an invalid pattern: {e}",
                        self.id
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // The trie folds case, so every casing of a keyword must reach a pattern too.
        if !patterns.is_empty() {
            let covered = |variant: String| patterns.iter().any(|p| p.is_match(&variant));
            if let Some(orphan) = self.keywords.iter().find(|kw| {
                let kw = kw.trim();
                !(covered(kw.to_lowercase()) && covered(kw.to_uppercase()))
            }) {
                return Err(WaypointError::Config(format!(
                    "template `{}` keyword `{orphan}` is not matched by any of its patterns",
                    self.id
                )));
            }
        }

        Ok(Template {
            id: self.id,
            priority: self.priority,
            patterns,
            keywords: self.keywords,
            responses: self.responses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_response_renders_as_text() {
        let resp = TemplateResponse::Static("hi".into()).render(&Captures::whole("x"));
        assert_eq!(resp, MatchResponse::text("hi"));
    }

    #[test]
    fn computed_response_sees_groups() {
        let template = Template::builder("echo", 1)
            .pattern(r"^echo (\w+)$")
            .computed(Locale::En, |caps| MatchResponse::text(caps.group_or_whole(1)))
            .build()
            .unwrap();
        let re = &template.patterns()[0];
        let caps = Captures::from_regex(&re.captures("echo shinjuku").unwrap());
        let resp = template.response(Locale::En).unwrap().render(&caps);
        assert_eq!(resp.content, "shinjuku");
    }

    #[test]
    fn group_or_whole_falls_back_to_full_match() {
        let caps = Captures::whole("新宿");
        assert_eq!(caps.group_or_whole(1), "新宿");
        assert_eq!(caps.get(1), None);
    }

    #[test]
    fn keyword_outside_patterns_is_rejected() {
        let err = Template::builder("greeting", 100)
            .pattern(r"^(?i)hello$")
            .keywords(["hello", "yo"])
            .text(Locale::En, "Hello!")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("`yo`"));
    }

    #[test]
    fn case_sensitive_pattern_cannot_back_a_keyword() {
        let err = Template::builder("greeting", 100)
            .pattern(r"^hello$")
            .keywords(["hello"])
            .text(Locale::En, "Hello!")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("`hello`"));

        let ok = Template::builder("greeting", 100)
            .pattern(r"(?i)^hello$")
            .keywords(["Hello"])
            .text(Locale::En, "Hello!")
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = Template::builder("broken", 1)
            .pattern("(unclosed")
            .text(Locale::En, "x")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn template_without_responses_is_rejected() {
        assert!(Template::builder("empty", 1).pattern("x").build().is_err());
    }
}
