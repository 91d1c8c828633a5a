use axum::http::Method;
use serde_json::json;
use tracing::info;

use crate::error::E2eResult;
use crate::mock::{HandlerOutcome, MockRule};

pub const CATCH_ALL_RULE: &str = "catch-all";

/// Fallback for any API path without a dedicated rule. Reads get an empty
/// paged list, everything else a generic acknowledgement, so unmodeled
/// endpoints never reach the network.
pub fn catch_all_rule() -> E2eResult<MockRule> {
    MockRule::new(CATCH_ALL_RULE, "**/api/**", |request| {
        info!("Unmodeled endpoint: {} {}", request.method, request.path());
        if request.method == Method::GET {
            HandlerOutcome::ok(json!({ "data": [], "total": 0, "page": 1, "limit": 25 }))
        } else {
            HandlerOutcome::ok(json!({ "success": true, "message": "Mock response" }))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRequest;

    #[test]
    fn test_get_returns_empty_page() {
        let rule = catch_all_rule().unwrap();
        let request = MockRequest::get("/api/console/payroll/runs").unwrap();
        assert!(rule.matches(&request));
        match rule.invoke(&request).unwrap() {
            HandlerOutcome::Fulfill(response) => {
                assert_eq!(response.body["total"], 0);
                assert_eq!(response.body["data"], json!([]));
            }
            HandlerOutcome::Delegate => panic!("catch-all never delegates"),
        }
    }

    #[test]
    fn test_mutation_returns_ack() {
        let rule = catch_all_rule().unwrap();
        let request = MockRequest::new(Method::DELETE, "/api/console/messages/m-1").unwrap();
        match rule.invoke(&request).unwrap() {
            HandlerOutcome::Fulfill(response) => assert_eq!(response.body["success"], true),
            HandlerOutcome::Delegate => panic!("catch-all never delegates"),
        }
    }

    #[test]
    fn test_ignores_non_api_paths() {
        let rule = catch_all_rule().unwrap();
        assert!(!rule.matches(&MockRequest::get("/assets/app.js").unwrap()));
    }
}
