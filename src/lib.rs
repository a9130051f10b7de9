//! API Twin Server
//!
//! Simulates an HTTP API by replaying recorded fixture files. Fixtures
//! live in a directory tree whose immediate subdirectories are "stories";
//! a request opts into a story through a selector token carried in a
//! header, query parameter, or cookie, and is matched structurally
//! against the fixtures in that story. Unmatched requests fall back to
//! the `_default` and `_manual` stories, then to static files or 404.
//!
//! # Features
//!
//! - **Structural Matching**: fixtures declare only the query/body fields
//!   they care about; requests may carry extra fields without breaking
//!   the match
//! - **Story Selection**: `story[:storyPathTag[:correlationId]]` token in
//!   the `x-api-twin` header, `api_twin` query parameter, or cookie
//! - **Specificity Ranking**: when several fixtures match, the one
//!   declaring the most fields wins
//! - **Fallback Stories**: `_default` and `_manual` answer requests no
//!   story-scoped fixture claims
//! - **Static Pass-Through**: unmatched requests can be served from a
//!   public directory
//!
//! # Example Fixture
//!
//! `api_twins/story1/[user_exists]form.json`:
//!
//! ```json
//! {
//!   "url": "/api/forms/v1/form",
//!   "query": {"mode": "2"},
//!   "reply": {"key1": "value1"},
//!   "replyHeaders": {"Content-Type": "application/json"}
//! }
//! ```

pub mod dispatch;
pub mod fixture;
pub mod loader;
pub mod matcher;
pub mod server;
pub mod story;

pub use dispatch::{DispatchEngine, MatchContext, Outcome, ResponseDescriptor};
pub use fixture::{FixtureParseError, FixtureRecord};
pub use loader::{load_fixtures, LoadError};
pub use server::{router, AppState};
pub use story::StorySelector;
