//! Fixture definitions.
//!
//! Parses one recorded fixture file into a normalized, immutable record
//! with its URL pattern compiled.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Story name that acts as a story-agnostic fallback.
pub const STORY_DEFAULT: &str = "_default";

/// Secondary fallback story, tried after [`STORY_DEFAULT`].
pub const STORY_MANUAL: &str = "_manual";

/// Errors produced while parsing a single fixture file.
#[derive(Debug, Error)]
pub enum FixtureParseError {
    /// File content did not decode as a JSON object with the expected fields.
    #[error("invalid fixture content: {0}")]
    Decode(#[from] serde_json::Error),

    /// The `url` field could not be compiled into a matcher.
    #[error("invalid url pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },
}

/// A fixture's `url` field, compiled once at load time.
///
/// Patterns are plain paths with optional `:name` parameter segments and
/// `*` wildcard segments, e.g. `/api/users/:id` or `/static/*`. Matching
/// is anchored and tolerates a trailing slash.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    pattern: String,
    regex: Regex,
}

impl UrlPattern {
    pub fn compile(pattern: &str) -> Result<Self, FixtureParseError> {
        if !pattern.starts_with('/') {
            return Err(FixtureParseError::Pattern {
                pattern: pattern.to_string(),
                reason: "must start with `/`".to_string(),
            });
        }

        let mut source = String::from("^");
        for segment in pattern.split('/').skip(1) {
            source.push('/');
            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(FixtureParseError::Pattern {
                        pattern: pattern.to_string(),
                        reason: format!("invalid parameter segment `{segment}`"),
                    });
                }
                source.push_str("([^/]+)");
            } else if segment == "*" {
                source.push_str("(.*)");
            } else {
                source.push_str(&regex::escape(segment));
            }
        }
        source.push_str("/?$");

        let regex = Regex::new(&source).map_err(|e| FixtureParseError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Test a request path against the compiled pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The original pattern text.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Raw fixture file shape. Field names mirror the on-disk JSON.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FixtureFile {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default = "default_status")]
    status: u16,
    #[serde(default = "default_reply")]
    reply: Value,
    #[serde(default = "empty_object")]
    query: Value,
    #[serde(default = "empty_object")]
    body: Value,
    #[serde(default)]
    reply_headers: HashMap<String, String>,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_status() -> u16 {
    200
}

fn default_reply() -> Value {
    Value::String(String::new())
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// One loaded fixture. Immutable after load.
#[derive(Debug, Clone)]
pub struct FixtureRecord {
    /// Story (subdirectory) this fixture belongs to.
    pub story: String,
    /// Optional sub-selector taken from a `[tag]` file name prefix.
    pub story_path: Option<String>,
    /// File name the fixture was loaded from, kept for diagnostics.
    pub file: String,
    /// HTTP method, uppercased.
    pub method: String,
    /// Compiled URL pattern.
    pub url: UrlPattern,
    /// Partial-match template for the request query.
    pub sample_query: Value,
    /// Partial-match template for the request body.
    pub sample_body: Value,
    /// Response status code.
    pub status: u16,
    /// Response body, written verbatim.
    pub reply: Value,
    /// Response headers, applied after any computed defaults.
    pub reply_headers: HashMap<String, String>,
}

static STORY_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]").expect("story path regex"));

/// Extract the optional `[tag]` story-path prefix from a fixture file name.
pub fn story_path_tag(file_name: &str) -> Option<String> {
    STORY_PATH_RE
        .captures(file_name)
        .map(|caps| caps[1].to_string())
}

/// Parse one fixture file's content into a [`FixtureRecord`].
pub fn parse_fixture(
    story: &str,
    file_name: &str,
    content: &str,
) -> Result<FixtureRecord, FixtureParseError> {
    let raw: FixtureFile = serde_json::from_str(content)?;
    let url = UrlPattern::compile(&raw.url)?;

    Ok(FixtureRecord {
        story: story.to_string(),
        story_path: story_path_tag(file_name),
        file: file_name.to_string(),
        method: raw.method.to_uppercase(),
        url,
        sample_query: raw.query,
        sample_body: raw.body,
        status: raw.status,
        reply: raw.reply,
        reply_headers: raw.reply_headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_fixture() {
        let record = parse_fixture("story1", "form.json", r#"{"url": "/api/form"}"#).unwrap();
        assert_eq!(record.story, "story1");
        assert_eq!(record.story_path, None);
        assert_eq!(record.method, "GET");
        assert_eq!(record.status, 200);
        assert_eq!(record.reply, json!(""));
        assert_eq!(record.sample_query, json!({}));
        assert_eq!(record.sample_body, json!({}));
        assert!(record.reply_headers.is_empty());
    }

    #[test]
    fn test_parse_full_fixture() {
        let content = r#"{
            "url": "/api/users/:id",
            "method": "post",
            "status": 201,
            "query": {"mode": "2"},
            "body": {"name": "John"},
            "reply": {"ok": true},
            "replyHeaders": {"Content-Type": "application/json"}
        }"#;
        let record = parse_fixture("story1", "[user_exists]create.json", content).unwrap();
        assert_eq!(record.story_path.as_deref(), Some("user_exists"));
        assert_eq!(record.method, "POST");
        assert_eq!(record.status, 201);
        assert_eq!(record.sample_query, json!({"mode": "2"}));
        assert_eq!(record.reply, json!({"ok": true}));
        assert_eq!(
            record.reply_headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_missing_url_is_an_error() {
        let err = parse_fixture("s", "f.json", r#"{"method": "GET"}"#).unwrap_err();
        assert!(matches!(err, FixtureParseError::Decode(_)));
    }

    #[test]
    fn test_non_object_content_is_an_error() {
        assert!(parse_fixture("s", "f.json", "[1, 2, 3]").is_err());
        assert!(parse_fixture("s", "f.json", "not json at all").is_err());
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let err = parse_fixture("s", "f.json", r#"{"url": "no-leading-slash"}"#).unwrap_err();
        assert!(matches!(err, FixtureParseError::Pattern { .. }));

        let err = parse_fixture("s", "f.json", r#"{"url": "/users/:"}"#).unwrap_err();
        assert!(matches!(err, FixtureParseError::Pattern { .. }));
    }

    #[test]
    fn test_url_pattern_literal() {
        let pattern = UrlPattern::compile("/api/forms/v1/form").unwrap();
        assert!(pattern.matches("/api/forms/v1/form"));
        assert!(pattern.matches("/api/forms/v1/form/"));
        assert!(!pattern.matches("/api/forms/v1/form/extra"));
        assert!(!pattern.matches("/api/forms/v1"));
    }

    #[test]
    fn test_url_pattern_params() {
        let pattern = UrlPattern::compile("/users/:id/posts").unwrap();
        assert!(pattern.matches("/users/42/posts"));
        assert!(!pattern.matches("/users//posts"));
        assert!(!pattern.matches("/users/42"));
    }

    #[test]
    fn test_url_pattern_wildcard() {
        let pattern = UrlPattern::compile("/assets/*").unwrap();
        assert!(pattern.matches("/assets/css/site.css"));
        assert!(pattern.matches("/assets/"));
    }

    #[test]
    fn test_story_path_tag_extraction() {
        assert_eq!(story_path_tag("[user_exists]form.json").as_deref(), Some("user_exists"));
        assert_eq!(story_path_tag("form.json"), None);
        assert_eq!(story_path_tag("[unclosed-form.json"), None);
    }
}
