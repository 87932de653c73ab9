// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Unknown keys and unknown enum values (task types, gate actions, provider
//! kinds, locales) get a "did you mean?" hint based on Jaro-Winkler similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a suggestion to be shown.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(waypoint::config::unknown_key),
        help("{}", format_choice_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value is not one of the accepted variants (e.g. `taskType = "reasonin"`).
    #[error("unknown value `{value}` for `{key}`")]
    #[diagnostic(
        code(waypoint::config::unknown_value),
        help("{}", format_choice_help(suggestion.as_deref(), valid_values))
    )]
    UnknownValue {
        key: String,
        value: String,
        suggestion: Option<String>,
        valid_values: String,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(waypoint::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(waypoint::config::missing_key),
        help("add `{key} = <value>` to your waypoint.toml")
    )]
    MissingKey { key: String },

    /// A semantic validation failure.
    #[error("validation error: {message}")]
    #[diagnostic(code(waypoint::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(waypoint::config::other))]
    Other(String),
}

fn format_choice_help(suggestion: Option<&str>, choices: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid choices: {choices}"),
        None => format!("valid choices: {choices}"),
    }
}

/// Convert a `figment::Error` (which may hold several errors) into diagnostics.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let key = dotted_path(&error);
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate_key(&error, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::UnknownVariant(value, expected) => ConfigError::UnknownValue {
                    key,
                    value: value.clone(),
                    suggestion: suggest_key(value, expected),
                    valid_values: expected.join(", "),
                },
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: if key.is_empty() {
                        field.to_string()
                    } else {
                        format!("{key}.{field}")
                    },
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key,
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.to_string(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn dotted_path(error: &figment::error::Error) -> String {
    error
        .path
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(".")
}

/// Resolve the file and byte span of an offending key, when it came from a file we read.
fn locate_key(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline strings carry no file path; fall back to the single known source.
    let source = match origin {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    let Some((path, content)) = source else {
        return (None, None);
    };

    match find_key_offset(content, &error.path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Find the byte offset of `field` inside the table named by `path`.
///
/// `path = ["gateway", "policies", "reasoning"]` looks for the
/// `[gateway.policies.reasoning]` header first; an empty path searches from
/// the top of the document.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = if path.is_empty() {
        0
    } else {
        let header = format!("[{}]", path.join("."));
        content.find(&header)? + header.len()
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let body = line.trim_start();
        if body.starts_with('[') && offset != start {
            // Next table: the key is not in this section.
            return None;
        }
        if let Some(rest) = body.strip_prefix(field) {
            if rest.starts_with([' ', '\t', '=']) {
                return Some(offset + (line.len() - body.len()));
            }
        }
        offset += line.len();
    }
    None
}

/// Suggest the closest valid key using Jaro-Winkler similarity.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_task_type_for_typo() {
        let valid = &[
            "classification",
            "simple",
            "reasoning",
            "context_heavy",
            "synthesis",
            "chat",
        ];
        assert_eq!(suggest_key("reasonin", valid), Some("reasoning".to_string()));
        assert_eq!(
            suggest_key("context_hevy", valid),
            Some("context_heavy".to_string())
        );
    }

    #[test]
    fn suggests_breaker_key() {
        let valid = &[
            "failure_threshold",
            "reset_timeout_ms",
            "half_open_success_threshold",
            "call_timeout_ms",
        ];
        assert_eq!(
            suggest_key("failure_treshold", valid),
            Some("failure_threshold".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["name", "log_level", "default_locale"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_nested_section() {
        let content = "[agent]\nname = \"a\"\n\n[gateway.policies.reasoning]\nmodle = \"x\"\n";
        let path = vec![
            "gateway".to_string(),
            "policies".to_string(),
            "reasoning".to_string(),
        ];
        let o = find_key_offset(content, &path, "modle").expect("should locate key");
        assert_eq!(&content[o..o + 5], "modle");
    }

    #[test]
    fn find_key_offset_stops_at_next_section() {
        let content = "[agent]\nname = \"a\"\n[breaker]\nfailure_treshold = 3\n";
        let path = vec!["agent".to_string()];
        assert_eq!(find_key_offset(content, &path, "failure_treshold"), None);
    }
}
