use axum::http::Method;
use serenity_fixtures::scheduling;

use super::is_collection;
use crate::error::E2eResult;
use crate::mock::{HandlerOutcome, MockRule};

pub fn rules() -> E2eResult<Vec<MockRule>> {
    Ok(vec![
        MockRule::new("scheduling.shifts", "**/api/console/scheduling/shifts{,/**,?**}", |request| {
            if !is_collection(request, "shifts") || request.method != Method::GET {
                return Ok(HandlerOutcome::Delegate);
            }
            HandlerOutcome::ok(scheduling::get_shifts_response(&request.params()))
        })?,
        MockRule::new("scheduling.shifts.assign", "**/api/console/scheduling/shifts/*/assign", |request| {
            let id = request.id_after("shifts").unwrap_or_default();
            HandlerOutcome::ok(scheduling::assign_shift_response(&id, request.body_str("caregiverId")))
        })?
        .method(Method::POST),
        MockRule::new("scheduling.open-shifts", "**/api/console/scheduling/open-shifts*", |_| {
            HandlerOutcome::ok(scheduling::get_open_shifts_response())
        })?
        .method(Method::GET),
    ])
}
