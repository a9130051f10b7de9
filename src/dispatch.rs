//! Dispatch engine.
//!
//! Holds the immutable fixture list and selects, for one request, the
//! fixture whose declared shape matches. Scope fallback runs through an
//! explicit ordered list of overrides: the request's own story first,
//! then `_default`, then `_manual`. Within a tier, the fixture declaring
//! the most fields wins; ties keep load order.

use crate::fixture::{FixtureRecord, STORY_DEFAULT, STORY_MANUAL};
use crate::matcher::{specificity, structural_match};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Everything the engine needs to know about one request. Built per
/// request, discarded after dispatch.
#[derive(Debug, Clone)]
pub struct MatchContext {
    pub story: Option<String>,
    pub story_path: Option<String>,
    pub method: String,
    pub path: String,
    pub body: Value,
    pub query: Value,
}

/// Response data for a matched fixture, written verbatim by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A fixture matched; respond with the descriptor.
    Matched(ResponseDescriptor),
    /// Nothing matched; the caller should defer to the next handler.
    NotHandled,
}

/// Story/story-path pair a tier is searched under.
struct Scope<'a> {
    story: Option<&'a str>,
    story_path: Option<&'a str>,
}

/// Request dispatcher over an immutable fixture list.
pub struct DispatchEngine {
    fixtures: Vec<FixtureRecord>,
}

impl DispatchEngine {
    pub fn new(fixtures: Vec<FixtureRecord>) -> Self {
        Self { fixtures }
    }

    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    /// Match one request against the fixture list.
    pub fn dispatch(&self, ctx: &MatchContext) -> Outcome {
        let scopes = [
            Scope {
                story: ctx.story.as_deref(),
                story_path: ctx.story_path.as_deref(),
            },
            Scope {
                story: Some(STORY_DEFAULT),
                story_path: None,
            },
            Scope {
                story: Some(STORY_MANUAL),
                story_path: None,
            },
        ];

        for scope in &scopes {
            if let Some(fixture) = self.best_match(ctx, scope) {
                debug!(
                    story = %fixture.story,
                    file = %fixture.file,
                    method = %ctx.method,
                    path = %ctx.path,
                    "request matched fixture"
                );
                return Outcome::Matched(ResponseDescriptor {
                    status: fixture.status,
                    headers: fixture.reply_headers.clone(),
                    body: fixture.reply.clone(),
                });
            }
        }

        info!(
            method = %ctx.method,
            path = %ctx.path,
            story = ctx.story.as_deref().unwrap_or(""),
            story_path = ctx.story_path.as_deref().unwrap_or(""),
            "no fixture matched"
        );
        Outcome::NotHandled
    }

    /// Highest-specificity candidate within one scope, first-loaded on
    /// ties.
    fn best_match(&self, ctx: &MatchContext, scope: &Scope<'_>) -> Option<&FixtureRecord> {
        let mut best: Option<(&FixtureRecord, u64)> = None;
        for fixture in &self.fixtures {
            if !Self::is_candidate(fixture, ctx, scope) {
                continue;
            }
            let weight = specificity(&fixture.sample_query) + specificity(&fixture.sample_body);
            if best.map_or(true, |(_, top)| weight > top) {
                best = Some((fixture, weight));
            }
        }
        best.map(|(fixture, _)| fixture)
    }

    fn is_candidate(fixture: &FixtureRecord, ctx: &MatchContext, scope: &Scope<'_>) -> bool {
        scope.story == Some(fixture.story.as_str())
            && scope.story_path == fixture.story_path.as_deref()
            && fixture.method == ctx.method
            && fixture.url.matches(&ctx.path)
            && structural_match(&ctx.body, &fixture.sample_body)
            && structural_match(&ctx.query, &fixture.sample_query)
    }
}
