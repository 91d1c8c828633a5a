//! Request interception: rules, the router that evaluates them, and the
//! per-domain rule sets that make up the mocked console backend.
//!
//! A [`MockRouter`] holds an ordered list of [`MockRule`]s plus an optional
//! fallback. Dispatch walks the list in order; the first rule whose pattern
//! and method match is invoked. A handler can fulfill the request, delegate
//! it to the next matching rule, or fail. A failure aborts the request the
//! way a dropped connection would, and is never retried by later rules.
//! The fallback is always tried last, after every registered rule.

pub mod endpoints;
pub mod pattern;

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use serenity_fixtures::{FixtureError, ListParams};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::error::{E2eError, E2eResult};
pub use endpoints::{all_endpoint_rules, catch_all_rule, mock_all_endpoints, router_with_all_endpoints, CATCH_ALL_RULE};
pub use pattern::UrlPattern;

/// Origin used to resolve relative request URLs.
const DEFAULT_ORIGIN: &str = "http://localhost";

/// An intercepted request as seen by handlers.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: Method,
    pub url: Url,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl MockRequest {
    pub fn new(method: Method, url: &str) -> E2eResult<Self> {
        let absolute = if url.starts_with('/') {
            format!("{}{}", DEFAULT_ORIGIN, url)
        } else {
            url.to_string()
        };
        let url = Url::parse(&absolute).map_err(|e| E2eError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self { method, url, headers: HashMap::new(), body: None })
    }

    pub fn get(url: &str) -> E2eResult<Self> {
        Self::new(Method::GET, url)
    }

    pub fn post(url: &str) -> E2eResult<Self> {
        Self::new(Method::POST, url)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a raw body; anything that is not JSON is kept as a string.
    pub fn with_body_text(mut self, text: &str) -> Self {
        if !text.is_empty() {
            self.body = Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())));
        }
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("authorization", format!("Bearer {}", token))
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn authorization(&self) -> Option<&str> {
        self.header("authorization")
    }

    pub fn params(&self) -> ListParams {
        ListParams::from_query(self.url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())))
    }

    /// Path segments following `marker`, e.g. `["u-1", "role"]` for
    /// marker `users` on `/api/console/admin/users/u-1/role`.
    pub fn segments_after(&self, marker: &str) -> Vec<String> {
        let segments: Vec<&str> = self.path().split('/').filter(|s| !s.is_empty()).collect();
        match segments.iter().rposition(|s| *s == marker) {
            Some(i) => segments[i + 1..].iter().map(|s| s.to_string()).collect(),
            None => Vec::new(),
        }
    }

    /// The single segment right after `marker`.
    pub fn id_after(&self, marker: &str) -> Option<String> {
        self.segments_after(marker).into_iter().next()
    }

    pub fn body_str(&self, field: &str) -> Option<&str> {
        self.body.as_ref()?.get(field)?.as_str()
    }

    pub fn body_object(&self) -> Option<&serde_json::Map<String, Value>> {
        self.body.as_ref()?.as_object()
    }
}

/// A synthesized response.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Value,
}

impl MockResponse {
    pub fn json(status: StatusCode, body: impl Serialize) -> Result<Self, HandlerError> {
        Ok(Self {
            status,
            content_type: "application/json".to_string(),
            body: serde_json::to_value(body)?,
        })
    }

    pub fn ok(body: impl Serialize) -> Result<Self, HandlerError> {
        Self::json(StatusCode::OK, body)
    }

    pub fn created(body: impl Serialize) -> Result<Self, HandlerError> {
        Self::json(StatusCode::CREATED, body)
    }

    pub fn error(status: StatusCode, message: &str) -> Result<Self, HandlerError> {
        Self::json(status, serde_json::json!({ "success": false, "error": message }))
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn body_text(&self) -> String {
        self.body.to_string()
    }
}

/// What a handler decided to do with a request.
#[derive(Debug, Clone)]
pub enum HandlerOutcome {
    Fulfill(MockResponse),
    /// Pass the request on to the next matching rule.
    Delegate,
}

impl HandlerOutcome {
    pub fn ok(body: impl Serialize) -> Result<Self, HandlerError> {
        Ok(Self::Fulfill(MockResponse::ok(body)?))
    }

    pub fn created(body: impl Serialize) -> Result<Self, HandlerError> {
        Ok(Self::Fulfill(MockResponse::created(body)?))
    }

    pub fn error(status: StatusCode, message: &str) -> Result<Self, HandlerError> {
        Ok(Self::Fulfill(MockResponse::error(status, message)?))
    }
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Fixture error: {0}")]
    Fixture(#[from] FixtureError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Handler panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Failed(String),
}

pub type Handler = Arc<dyn Fn(&MockRequest) -> Result<HandlerOutcome, HandlerError> + Send + Sync>;

#[derive(Clone)]
pub struct MockRule {
    pub name: String,
    pub pattern: UrlPattern,
    /// `None` matches every method.
    pub method: Option<Method>,
    handler: Handler,
}

impl std::fmt::Debug for MockRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("method", &self.method)
            .finish()
    }
}

impl MockRule {
    pub fn new<F>(name: &str, pattern: &str, handler: F) -> E2eResult<Self>
    where
        F: Fn(&MockRequest) -> Result<HandlerOutcome, HandlerError> + Send + Sync + 'static,
    {
        Ok(Self {
            name: name.to_string(),
            pattern: UrlPattern::glob(pattern)?,
            method: None,
            handler: Arc::new(handler),
        })
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn matches(&self, request: &MockRequest) -> bool {
        self.method.as_ref().map_or(true, |m| *m == request.method)
            && self.pattern.matches(request.url.as_str())
    }

    /// Run the handler, converting a panic into a handler failure.
    pub fn invoke(&self, request: &MockRequest) -> Result<HandlerOutcome, HandlerError> {
        match catch_unwind(AssertUnwindSafe(|| (self.handler)(request))) {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(HandlerError::Panicked(message))
            }
        }
    }
}

/// Result of routing one request.
#[derive(Debug, Clone)]
pub enum Dispatch {
    Fulfilled { rule: String, response: MockResponse },
    Aborted { rule: String, reason: String },
    /// Nothing intercepted the request; it would reach the real network.
    Unmatched,
}

impl Dispatch {
    pub fn rule(&self) -> Option<&str> {
        match self {
            Dispatch::Fulfilled { rule, .. } | Dispatch::Aborted { rule, .. } => Some(rule),
            Dispatch::Unmatched => None,
        }
    }

    pub fn response(&self) -> Option<&MockResponse> {
        match self {
            Dispatch::Fulfilled { response, .. } => Some(response),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockRouter {
    rules: Vec<MockRule>,
    fallback: Option<MockRule>,
}

impl MockRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. A rule whose name is already registered is ignored,
    /// so installing the same rule set twice leaves the router unchanged.
    pub fn register(&mut self, rule: MockRule) -> bool {
        if self.contains(&rule.name) {
            debug!("Rule '{}' already registered", rule.name);
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn register_all(&mut self, rules: impl IntoIterator<Item = MockRule>) -> usize {
        let mut added = 0;
        for rule in rules {
            if self.register(rule) {
                added += 1;
            }
        }
        added
    }

    pub fn set_fallback(&mut self, rule: MockRule) {
        self.fallback = Some(rule);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name == name)
            || self.fallback.as_ref().map_or(false, |r| r.name == name)
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().chain(self.fallback.iter()).map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len() + usize::from(self.fallback.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dispatch(&self, request: &MockRequest) -> Dispatch {
        for rule in self.rules.iter().chain(self.fallback.iter()) {
            if !rule.matches(request) {
                continue;
            }
            match rule.invoke(request) {
                Ok(HandlerOutcome::Fulfill(response)) => {
                    debug!("{} {} -> {} ({})", request.method, request.path(), response.status, rule.name);
                    return Dispatch::Fulfilled { rule: rule.name.clone(), response };
                }
                Ok(HandlerOutcome::Delegate) => {
                    debug!("{} {} delegated by {}", request.method, request.path(), rule.name);
                }
                Err(e) => {
                    warn!("Handler '{}' failed for {} {}: {}", rule.name, request.method, request.path(), e);
                    return Dispatch::Aborted { rule: rule.name.clone(), reason: e.to_string() };
                }
            }
        }
        Dispatch::Unmatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed(name: &str, pattern: &str, body: Value) -> MockRule {
        MockRule::new(name, pattern, move |_| HandlerOutcome::ok(body.clone())).unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let mut router = MockRouter::new();
        router.register(fixed("first", "**/api/things*", json!(1)));
        router.register(fixed("second", "**/api/things*", json!(2)));
        let dispatch = router.dispatch(&MockRequest::get("/api/things").unwrap());
        assert_eq!(dispatch.rule(), Some("first"));
        assert_eq!(dispatch.response().unwrap().body, json!(1));
    }

    #[test]
    fn test_delegate_falls_through() {
        let mut router = MockRouter::new();
        router.register(MockRule::new("broad", "**/api/things**", |_| Ok(HandlerOutcome::Delegate)).unwrap());
        router.register(fixed("narrow", "**/api/things/*", json!("item")));
        let dispatch = router.dispatch(&MockRequest::get("/api/things/t-1").unwrap());
        assert_eq!(dispatch.rule(), Some("narrow"));
    }

    #[test]
    fn test_fallback_is_evaluated_last() {
        let mut router = MockRouter::new();
        router.set_fallback(fixed("catch-all", "**/api/**", json!("fallback")));
        router.register(fixed("specific", "**/api/things", json!("specific")));
        let dispatch = router.dispatch(&MockRequest::get("/api/things").unwrap());
        assert_eq!(dispatch.rule(), Some("specific"));
        let dispatch = router.dispatch(&MockRequest::get("/api/other").unwrap());
        assert_eq!(dispatch.rule(), Some("catch-all"));
    }

    #[test]
    fn test_handler_failure_aborts_without_fallthrough() {
        let mut router = MockRouter::new();
        router.register(
            MockRule::new("broken", "**/api/things", |_| Err(HandlerError::Failed("boom".into()))).unwrap(),
        );
        router.set_fallback(fixed("catch-all", "**/api/**", json!({})));
        match router.dispatch(&MockRequest::get("/api/things").unwrap()) {
            Dispatch::Aborted { rule, reason } => {
                assert_eq!(rule, "broken");
                assert_eq!(reason, "boom");
            }
            other => panic!("expected abort, got {:?}", other),
        }
    }

    #[test]
    fn test_panicking_handler_aborts() {
        let mut router = MockRouter::new();
        router.register(MockRule::new("panics", "**/api/things", |_| panic!("handler bug")).unwrap());
        let dispatch = router.dispatch(&MockRequest::get("/api/things").unwrap());
        assert!(matches!(dispatch, Dispatch::Aborted { .. }));
    }

    #[test]
    fn test_method_filter() {
        let mut router = MockRouter::new();
        router.register(fixed("post-only", "**/api/things", json!("posted")).method(Method::POST));
        assert!(matches!(router.dispatch(&MockRequest::get("/api/things").unwrap()), Dispatch::Unmatched));
        assert!(router.dispatch(&MockRequest::post("/api/things").unwrap()).response().is_some());
    }

    #[test]
    fn test_duplicate_names_are_ignored() {
        let mut router = MockRouter::new();
        assert!(router.register(fixed("same", "**/a", json!(1))));
        assert!(!router.register(fixed("same", "**/b", json!(2))));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_request_helpers() {
        let request = MockRequest::new(Method::PUT, "/api/console/admin/users/u-7/role?x=1")
            .unwrap()
            .with_bearer("tok")
            .with_body_text(r#"{"role":"scheduler"}"#);
        assert_eq!(request.id_after("users").as_deref(), Some("u-7"));
        assert_eq!(request.segments_after("users"), vec!["u-7", "role"]);
        assert_eq!(request.authorization(), Some("Bearer tok"));
        assert_eq!(request.body_str("role"), Some("scheduler"));
        assert_eq!(request.params().extra.get("x").map(String::as_str), Some("1"));
    }
}
