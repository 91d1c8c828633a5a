use axum::http::Method;
use serenity_fixtures::hr;

use super::{bad_request_on_fixture_error, is_collection};
use crate::error::E2eResult;
use crate::mock::{HandlerOutcome, MockRule};

pub fn rules() -> E2eResult<Vec<MockRule>> {
    Ok(vec![
        MockRule::new("hr.applicants", "**/api/console/hr/applicants{,/**,?**}", |request| {
            if !is_collection(request, "applicants") || request.method != Method::GET {
                return Ok(HandlerOutcome::Delegate);
            }
            HandlerOutcome::ok(hr::get_applicants_response(&request.params()))
        })?,
        MockRule::new("hr.applicants.advance", "**/api/console/hr/applicants/*/advance", |request| {
            let id = request.id_after("applicants").unwrap_or_default();
            bad_request_on_fixture_error(hr::advance_applicant_response(&id), HandlerOutcome::ok)
        })?
        .method(Method::POST),
        MockRule::new("hr.employees", "**/api/console/hr/employees*", |request| {
            HandlerOutcome::ok(hr::get_employees_response(&request.params()))
        })?
        .method(Method::GET),
        MockRule::new("hr.onboarding", "**/api/console/hr/onboarding*", |_| {
            HandlerOutcome::ok(hr::get_onboarding_response())
        })?
        .method(Method::GET),
    ])
}
