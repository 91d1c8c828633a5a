use axum::http::{Method, StatusCode};
use serde_json::json;
use serenity_common::Role;
use serenity_fixtures::{audit, users, ItemResponse, Overrides};

use super::{bad_request_on_fixture_error, body_overrides, is_collection};
use crate::error::E2eResult;
use crate::mock::{HandlerOutcome, MockRule};

pub fn rules() -> E2eResult<Vec<MockRule>> {
    Ok(vec![
        MockRule::new("admin.users", "**/api/console/admin/users{,/**,?**}", |request| {
            if !is_collection(request, "users") {
                return Ok(HandlerOutcome::Delegate);
            }
            match request.method {
                Method::GET => HandlerOutcome::ok(users::get_users_response(&request.params())),
                Method::POST => bad_request_on_fixture_error(
                    body_overrides(request).and_then(|o| users::generate_user_with(&o)),
                    |user| HandlerOutcome::created(ItemResponse::new(user)),
                ),
                _ => Ok(HandlerOutcome::Delegate),
            }
        })?,
        MockRule::new("admin.users.role", "**/api/console/admin/users/*/role", |request| {
            if !matches!(request.method, Method::PUT | Method::PATCH) {
                return Ok(HandlerOutcome::Delegate);
            }
            let id = request.id_after("users").unwrap_or_default();
            let Some(Ok(role)) = request.body_str("role").map(str::parse::<Role>) else {
                return HandlerOutcome::error(StatusCode::BAD_REQUEST, "Invalid role");
            };
            bad_request_on_fixture_error(
                users::generate_user_with(&Overrides::new().set("id", id).set("role", role.as_str())),
                |user| HandlerOutcome::ok(ItemResponse::new(user)),
            )
        })?,
        MockRule::new("admin.users.item", "**/api/console/admin/users/*", |request| {
            let id = request.id_after("users").unwrap_or_default();
            match request.method {
                Method::GET => bad_request_on_fixture_error(users::get_user_response(&id), HandlerOutcome::ok),
                Method::PUT | Method::PATCH => bad_request_on_fixture_error(
                    body_overrides(request)
                        .and_then(|o| users::generate_user_with(&o.set("id", id.as_str()))),
                    |user| HandlerOutcome::ok(ItemResponse::new(user)),
                ),
                Method::DELETE => HandlerOutcome::ok(json!({ "success": true, "message": "User deleted" })),
                _ => Ok(HandlerOutcome::Delegate),
            }
        })?,
        MockRule::new("admin.roles", "**/api/console/admin/roles*", |_| {
            HandlerOutcome::ok(users::get_roles_response())
        })?
        .method(Method::GET),
        MockRule::new("admin.audit-logs", "**/api/console/admin/audit-logs*", |request| {
            HandlerOutcome::ok(audit::get_audit_logs_response(&request.params()))
        })?
        .method(Method::GET),
        MockRule::new("admin.stats", "**/api/console/admin/stats*", |_| {
            HandlerOutcome::ok(users::get_admin_stats_response())
        })?
        .method(Method::GET),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Dispatch, MockRequest, MockRouter};

    fn router() -> MockRouter {
        let mut router = MockRouter::new();
        router.register_all(rules().unwrap());
        router
    }

    #[test]
    fn test_broad_users_rule_delegates_sub_paths() {
        let dispatch = router().dispatch(&MockRequest::get("/api/console/admin/users/u-42").unwrap());
        assert_eq!(dispatch.rule(), Some("admin.users.item"));
        assert_eq!(dispatch.response().unwrap().body["data"]["id"], "u-42");
    }

    #[test]
    fn test_role_change() {
        let request = MockRequest::new(Method::PUT, "/api/console/admin/users/u-1/role")
            .unwrap()
            .with_json(json!({ "role": "scheduler" }));
        let dispatch = router().dispatch(&request);
        assert_eq!(dispatch.rule(), Some("admin.users.role"));
        assert_eq!(dispatch.response().unwrap().body["data"]["role"], "scheduler");
    }

    #[test]
    fn test_role_change_rejects_unknown_role() {
        let request = MockRequest::new(Method::PUT, "/api/console/admin/users/u-1/role")
            .unwrap()
            .with_json(json!({ "role": "overlord" }));
        let response = router().dispatch(&request).response().cloned().unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_role_read_is_not_a_role_change() {
        let dispatch = router().dispatch(&MockRequest::get("/api/console/admin/users/u-1/role").unwrap());
        assert!(matches!(dispatch, Dispatch::Unmatched));
    }

    #[test]
    fn test_sibling_path_is_not_the_users_list() {
        let dispatch = router().dispatch(&MockRequest::get("/api/console/admin/users-export").unwrap());
        assert!(matches!(dispatch, Dispatch::Unmatched));

        let dispatch = router().dispatch(&MockRequest::get("/api/console/admin/users?role=cfo").unwrap());
        assert_eq!(dispatch.rule(), Some("admin.users"));
    }

    #[test]
    fn test_huge_page_is_an_empty_list() {
        let request = MockRequest::get("/api/console/admin/users?page=18446744073709551615&limit=2").unwrap();
        let dispatch = router().dispatch(&request);
        assert_eq!(dispatch.rule(), Some("admin.users"));
        let body = &dispatch.response().unwrap().body;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_create_user_is_201() {
        let request = MockRequest::post("/api/console/admin/users")
            .unwrap()
            .with_json(json!({ "firstName": "Ada", "role": "hr_manager" }));
        let response = router().dispatch(&request).response().cloned().unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["data"]["firstName"], "Ada");
        assert_eq!(response.body["data"]["role"], "hr_manager");
    }

    #[test]
    fn test_create_user_with_unknown_field_is_400() {
        let request = MockRequest::post("/api/console/admin/users")
            .unwrap()
            .with_json(json!({ "favouriteColour": "teal" }));
        let response = router().dispatch(&request).response().cloned().unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_audit_logs_are_paged() {
        let dispatch = router().dispatch(&MockRequest::get("/api/console/admin/audit-logs?page=2&limit=10").unwrap());
        let body = &dispatch.response().unwrap().body;
        assert_eq!(body["page"], 2);
        assert_eq!(body["limit"], 10);
        assert_eq!(body["data"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn test_roles_is_bare_array() {
        let dispatch = router().dispatch(&MockRequest::get("/api/console/admin/roles").unwrap());
        assert_eq!(dispatch.response().unwrap().body.as_array().unwrap().len(), 15);
    }

    #[test]
    fn test_unhandled_method_falls_through() {
        let request = MockRequest::new(Method::DELETE, "/api/console/admin/users").unwrap();
        assert!(matches!(router().dispatch(&request), Dispatch::Unmatched));
    }
}
