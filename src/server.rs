//! HTTP layer.
//!
//! A single fallback route owns every method and path: it normalizes the
//! request into a [`MatchContext`], asks the dispatch engine for a
//! fixture, and writes the stored response. Unmatched requests fall
//! through to static file serving when a public directory is configured,
//! otherwise to a JSON 404.

use crate::dispatch::{DispatchEngine, MatchContext, Outcome, ResponseDescriptor};
use crate::story::{StorySelector, TWIN_HEADER, TWIN_PARAM};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower::util::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Maximum buffered request body size.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Shared, read-only application state.
pub struct AppState {
    pub engine: DispatchEngine,
    pub public_dir: Option<PathBuf>,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle_twin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_twin(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, "request body too large");
        }
    };

    let query_params = parse_query_string(parts.uri.query().unwrap_or(""));
    let cookies = parse_cookies(&parts.headers);
    let header_token = parts
        .headers
        .get(TWIN_HEADER)
        .and_then(|value| value.to_str().ok());
    let selector = StorySelector::resolve(
        header_token,
        query_params.get(TWIN_PARAM).map(String::as_str),
        cookies.get(TWIN_PARAM).map(String::as_str),
    );

    let ctx = MatchContext {
        story: selector.story,
        story_path: selector.story_path,
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        body: parse_body(&bytes),
        query: query_value(&query_params),
    };

    match state.engine.dispatch(&ctx) {
        Outcome::Matched(descriptor) => render(descriptor),
        Outcome::NotHandled => pass_through(&state, parts).await,
    }
}

/// Write a matched fixture's stored response.
///
/// String replies go out verbatim as text; anything else is JSON-encoded.
/// `replyHeaders` are applied last so a fixture can override the computed
/// content type.
fn render(descriptor: ResponseDescriptor) -> Response {
    let (bytes, content_type) = match &descriptor.body {
        Value::String(text) => (text.clone().into_bytes(), "text/plain; charset=utf-8"),
        other => match serde_json::to_vec(other) {
            Ok(bytes) => (bytes, "application/json"),
            Err(_) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "unencodable reply");
            }
        },
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() =
        StatusCode::from_u16(descriptor.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));

    for (name, value) in &descriptor.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!(header = %name, "skipping invalid reply header"),
        }
    }

    response
}

/// Next handler in the pipeline: static files if configured, else 404.
async fn pass_through(state: &AppState, parts: Parts) -> Response {
    match &state.public_dir {
        Some(dir) => {
            let req = Request::from_parts(parts, Body::empty());
            match ServeDir::new(dir).oneshot(req).await {
                Ok(response) => response.into_response(),
                Err(err) => match err {},
            }
        }
        None => error_response(StatusCode::NOT_FOUND, "Not found"),
    }
}

/// JSON error body in the `{"error": {"message": ...}}` shape.
fn error_response(status: StatusCode, message: &str) -> Response {
    let body = json!({ "error": { "message": message } });
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

/// Lenient JSON body decoding: empty or non-JSON bodies degrade to `{}`
/// so matching falls back to the fixture's body template defaults.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

/// Query parameters as a JSON object of strings, the shape fixture
/// `query` templates are written against.
fn query_value(params: &HashMap<String, String>) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect(),
    )
}

/// Parse a query string into key-value pairs.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for part in query.split('&') {
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once('=') {
            params.insert(percent_decode(key), percent_decode(value));
        } else {
            params.insert(percent_decode(part), String::new());
        }
    }

    params
}

/// Simple URL decoding.
fn percent_decode(s: &str) -> String {
    let mut out = Vec::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() == 2 {
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    out.push(byte);
                    continue;
                }
            }
            out.push(b'%');
            out.extend_from_slice(hex.as_bytes());
        } else if ch == '+' {
            out.push(b' ');
        } else {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    let Some(raw) = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
    else {
        return cookies;
    };
    for pair in raw.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            cookies.insert(name.to_string(), value.to_string());
        }
    }
    cookies
}
