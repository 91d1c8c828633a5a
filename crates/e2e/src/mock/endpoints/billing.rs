use axum::http::Method;
use serenity_fixtures::billing;

use super::is_collection;
use crate::error::E2eResult;
use crate::mock::{HandlerOutcome, MockRule};

pub fn rules() -> E2eResult<Vec<MockRule>> {
    Ok(vec![
        MockRule::new("billing.claims", "**/api/console/billing/claims{,/**,?**}", |request| {
            if !is_collection(request, "claims") || request.method != Method::GET {
                return Ok(HandlerOutcome::Delegate);
            }
            HandlerOutcome::ok(billing::get_claims_response(&request.params()))
        })?,
        MockRule::new("billing.claims.submit", "**/api/console/billing/claims/*/submit", |request| {
            let id = request.id_after("claims").unwrap_or_default();
            HandlerOutcome::ok(billing::submit_claim_response(&id))
        })?
        .method(Method::POST),
        MockRule::new("billing.summary", "**/api/console/billing/summary*", |_| {
            HandlerOutcome::ok(billing::get_billing_summary_response())
        })?
        .method(Method::GET),
    ])
}
