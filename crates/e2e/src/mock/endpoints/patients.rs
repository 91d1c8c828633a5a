use axum::http::Method;
use serenity_fixtures::{patients, ItemResponse};

use super::{bad_request_on_fixture_error, body_overrides, is_collection};
use crate::error::E2eResult;
use crate::mock::{HandlerOutcome, MockRule};

pub fn rules() -> E2eResult<Vec<MockRule>> {
    Ok(vec![
        MockRule::new("patients", "**/api/console/patients{,/**,?**}", |request| {
            if !is_collection(request, "patients") {
                return Ok(HandlerOutcome::Delegate);
            }
            match request.method {
                Method::GET => HandlerOutcome::ok(patients::get_patients_response(&request.params())),
                Method::POST => bad_request_on_fixture_error(
                    body_overrides(request).and_then(|o| patients::generate_patient_with(&o)),
                    |patient| HandlerOutcome::created(ItemResponse::new(patient)),
                ),
                _ => Ok(HandlerOutcome::Delegate),
            }
        })?,
        MockRule::new("patients.item", "**/api/console/patients/*", |request| {
            let id = request.id_after("patients").unwrap_or_default();
            match request.method {
                Method::GET => bad_request_on_fixture_error(patients::get_patient_response(&id), HandlerOutcome::ok),
                Method::PUT | Method::PATCH => bad_request_on_fixture_error(
                    body_overrides(request)
                        .and_then(|o| patients::generate_patient_with(&o.set("id", id.as_str()))),
                    |patient| HandlerOutcome::ok(ItemResponse::new(patient)),
                ),
                _ => Ok(HandlerOutcome::Delegate),
            }
        })?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRequest, MockRouter};
    use axum::http::StatusCode;
    use serde_json::json;

    fn router() -> MockRouter {
        let mut router = MockRouter::new();
        router.register_all(rules().unwrap());
        router
    }

    #[test]
    fn test_list_honors_status_filter() {
        let dispatch = router().dispatch(&MockRequest::get("/api/console/patients?status=active").unwrap());
        let body = &dispatch.response().unwrap().body;
        assert_eq!(body["success"], true);
        for patient in body["data"].as_array().unwrap() {
            assert_eq!(patient["status"], "active");
        }
    }

    #[test]
    fn test_item_uses_path_id() {
        let dispatch = router().dispatch(&MockRequest::get("/api/console/patients/pat-001").unwrap());
        assert_eq!(dispatch.rule(), Some("patients.item"));
        assert_eq!(dispatch.response().unwrap().body["data"]["id"], "pat-001");
    }

    #[test]
    fn test_update_merges_body() {
        let request = MockRequest::new(Method::PATCH, "/api/console/patients/pat-9")
            .unwrap()
            .with_json(json!({ "status": "discharged" }));
        let response = router().dispatch(&request).response().cloned().unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["status"], "discharged");
        assert_eq!(response.body["data"]["id"], "pat-9");
    }
}
