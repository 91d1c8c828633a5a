use axum::http::Method;
use serenity_fixtures::credentials;

use super::is_collection;
use crate::error::E2eResult;
use crate::mock::{HandlerOutcome, MockRule};

pub fn rules() -> E2eResult<Vec<MockRule>> {
    Ok(vec![
        MockRule::new("credentials", "**/api/console/credentials{,/**,?**}", |request| {
            if !is_collection(request, "credentials") {
                return Ok(HandlerOutcome::Delegate);
            }
            HandlerOutcome::ok(credentials::get_credentials_response(&request.params()))
        })?
        .method(Method::GET),
        MockRule::new("credentials.expiring", "**/api/console/credentials/expiring*", |request| {
            HandlerOutcome::ok(credentials::get_expiring_credentials_response(&request.params()))
        })?
        .method(Method::GET),
        MockRule::new("credentials.summary", "**/api/console/credentials/summary*", |_| {
            HandlerOutcome::ok(credentials::get_credential_summary_response())
        })?
        .method(Method::GET),
        MockRule::new("credentials.caregiver", "**/api/console/credentials/caregiver/*", |request| {
            let id = request.id_after("caregiver").unwrap_or_default();
            HandlerOutcome::ok(credentials::get_caregiver_credentials_response(&id))
        })?
        .method(Method::GET),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRequest, MockRouter};

    fn router() -> MockRouter {
        let mut router = MockRouter::new();
        router.register_all(rules().unwrap());
        router
    }

    #[test]
    fn test_expiring_window_from_query() {
        let dispatch = router().dispatch(&MockRequest::get("/api/console/credentials/expiring?days=14").unwrap());
        assert_eq!(dispatch.rule(), Some("credentials.expiring"));
        for credential in dispatch.response().unwrap().body["data"].as_array().unwrap() {
            let days = credential["daysLeft"].as_i64().unwrap();
            assert!((0..=14).contains(&days));
        }
    }

    #[test]
    fn test_caregiver_credentials() {
        let dispatch = router().dispatch(&MockRequest::get("/api/console/credentials/caregiver/cg-3").unwrap());
        for credential in dispatch.response().unwrap().body["data"].as_array().unwrap() {
            assert_eq!(credential["caregiverId"], "cg-3");
        }
    }

    #[test]
    fn test_summary_is_bare_object() {
        let dispatch = router().dispatch(&MockRequest::get("/api/console/credentials/summary").unwrap());
        assert!(dispatch.response().unwrap().body.get("success").is_none());
    }
}
