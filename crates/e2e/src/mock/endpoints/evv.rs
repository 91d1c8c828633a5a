use axum::http::Method;
use serenity_fixtures::evv;

use crate::error::E2eResult;
use crate::mock::{HandlerOutcome, MockRule};

pub fn rules() -> E2eResult<Vec<MockRule>> {
    Ok(vec![
        MockRule::new("evv.visits", "**/api/console/evv/visits*", |request| {
            HandlerOutcome::ok(evv::get_visits_response(&request.params()))
        })?
        .method(Method::GET),
        MockRule::new("evv.exceptions", "**/api/console/evv/exceptions*", |_| {
            HandlerOutcome::ok(evv::get_exceptions_response())
        })?
        .method(Method::GET),
        MockRule::new("evv.clock-in", "**/api/console/evv/clock-in", |request| {
            HandlerOutcome::ok(evv::clock_in_response(request.body_str("visitId")))
        })?
        .method(Method::POST),
        MockRule::new("evv.clock-out", "**/api/console/evv/clock-out", |request| {
            HandlerOutcome::ok(evv::clock_out_response(request.body_str("visitId")))
        })?
        .method(Method::POST),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRequest, MockRouter};
    use serde_json::json;

    #[test]
    fn test_clock_in_pins_visit() {
        let mut router = MockRouter::new();
        router.register_all(rules().unwrap());
        let request = MockRequest::post("/api/console/evv/clock-in")
            .unwrap()
            .with_json(json!({ "visitId": "vis-77" }));
        let body = router.dispatch(&request).response().unwrap().body.clone();
        assert_eq!(body["visit"]["id"], "vis-77");
        assert_eq!(body["visit"]["status"], "in_progress");
    }
}
