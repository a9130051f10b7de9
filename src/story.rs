//! Story selection.
//!
//! A request opts into a story by carrying a compound selector token of
//! the form `story[:storyPathTag[:correlationId]]` in a header, query
//! parameter, or cookie.

/// Header carrying the selector token. Checked first.
pub const TWIN_HEADER: &str = "x-api-twin";

/// Query parameter and cookie name carrying the selector token.
pub const TWIN_PARAM: &str = "api_twin";

/// Decomposed selector token. All fields absent when no token was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorySelector {
    pub story: Option<String>,
    pub story_path: Option<String>,
    pub correlation_id: Option<String>,
}

impl StorySelector {
    /// Resolve the selector from the three carriers, in strict priority
    /// order: header, then query parameter, then cookie. Empty strings
    /// count as absent.
    pub fn resolve(
        header: Option<&str>,
        query: Option<&str>,
        cookie: Option<&str>,
    ) -> Self {
        let token = [header, query, cookie]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty());
        match token {
            Some(token) => Self::parse(token),
            None => Self::default(),
        }
    }

    /// Split a token on `:` into up to three parts. Missing or empty
    /// trailing parts degrade to absent; no other validation.
    pub fn parse(token: &str) -> Self {
        let mut parts = token.splitn(3, ':').map(|part| {
            if part.is_empty() {
                None
            } else {
                Some(part.to_string())
            }
        });
        Self {
            story: parts.next().flatten(),
            story_path: parts.next().flatten(),
            correlation_id: parts.next().flatten(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(story: &str, path: &str, id: &str) -> StorySelector {
        StorySelector {
            story: (!story.is_empty()).then(|| story.to_string()),
            story_path: (!path.is_empty()).then(|| path.to_string()),
            correlation_id: (!id.is_empty()).then(|| id.to_string()),
        }
    }

    #[test]
    fn test_parse_full_token() {
        assert_eq!(
            StorySelector::parse("story1:user_exists:abc-123"),
            selector("story1", "user_exists", "abc-123")
        );
    }

    #[test]
    fn test_parse_partial_tokens() {
        assert_eq!(StorySelector::parse("story1"), selector("story1", "", ""));
        assert_eq!(
            StorySelector::parse("story1:user_exists"),
            selector("story1", "user_exists", "")
        );
        assert_eq!(StorySelector::parse("story1:"), selector("story1", "", ""));
        assert_eq!(
            StorySelector::parse("story1::abc"),
            selector("story1", "", "abc")
        );
    }

    #[test]
    fn test_extra_colons_stay_in_correlation_id() {
        assert_eq!(
            StorySelector::parse("a:b:c:d"),
            selector("a", "b", "c:d")
        );
    }

    #[test]
    fn test_resolve_priority_order() {
        let resolved = StorySelector::resolve(Some("h:1"), Some("q:2"), Some("c:3"));
        assert_eq!(resolved.story.as_deref(), Some("h"));

        let resolved = StorySelector::resolve(None, Some("q:2"), Some("c:3"));
        assert_eq!(resolved.story.as_deref(), Some("q"));

        let resolved = StorySelector::resolve(None, None, Some("c:3"));
        assert_eq!(resolved.story.as_deref(), Some("c"));
    }

    #[test]
    fn test_empty_carrier_falls_through() {
        let resolved = StorySelector::resolve(Some(""), Some("story1"), None);
        assert_eq!(resolved.story.as_deref(), Some("story1"));
    }

    #[test]
    fn test_no_token_resolves_to_absent() {
        assert_eq!(
            StorySelector::resolve(None, None, None),
            StorySelector::default()
        );
    }
}
