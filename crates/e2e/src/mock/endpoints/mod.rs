//! The mocked console backend, one rule set per domain.
//!
//! Within a domain, a broad rule covering a resource prefix comes first and
//! delegates anything deeper than the collection path, so the narrower
//! item and action rules registered after it still get their turn.

mod admin;
mod auth;
mod billing;
mod catch_all;
mod credentials;
mod evv;
mod hr;
mod patients;
mod scheduling;

use axum::http::StatusCode;
use serenity_fixtures::{FixtureError, Overrides};
use tracing::info;

use super::{HandlerError, HandlerOutcome, MockRequest, MockRouter, MockRule};
use crate::error::E2eResult;
use crate::page::Page;

pub use catch_all::{catch_all_rule, CATCH_ALL_RULE};

/// Every modeled endpoint, in evaluation order.
pub fn all_endpoint_rules() -> E2eResult<Vec<MockRule>> {
    let mut rules = Vec::new();
    rules.extend(auth::rules()?);
    rules.extend(admin::rules()?);
    rules.extend(patients::rules()?);
    rules.extend(credentials::rules()?);
    rules.extend(hr::rules()?);
    rules.extend(evv::rules()?);
    rules.extend(scheduling::rules()?);
    rules.extend(billing::rules()?);
    Ok(rules)
}

/// A router preloaded with every endpoint and the catch-all fallback.
pub fn router_with_all_endpoints() -> E2eResult<MockRouter> {
    let mut router = MockRouter::new();
    router.register_all(all_endpoint_rules()?);
    router.set_fallback(catch_all_rule()?);
    Ok(router)
}

/// Install the whole mocked backend on a page. Must run before the page
/// navigates, or early requests reach the real network. Calling it again on
/// the same page changes nothing.
pub async fn mock_all_endpoints(page: &dyn Page) -> E2eResult<()> {
    let rules = all_endpoint_rules()?;
    let count = rules.len();
    for rule in rules {
        page.route(rule).await?;
    }
    page.route_fallback(catch_all_rule()?).await?;
    info!("Installed {} endpoint mocks plus catch-all", count);
    Ok(())
}

/// True when the request addresses the collection itself: its last path
/// segment is exactly `marker`. Sub-resources and siblings such as
/// `users-export` are not the collection.
fn is_collection(request: &MockRequest, marker: &str) -> bool {
    request.path().rsplit('/').find(|s| !s.is_empty()) == Some(marker)
}

/// Overrides taken from a JSON request body. A missing body yields none.
fn body_overrides(request: &MockRequest) -> Result<Overrides, FixtureError> {
    match &request.body {
        Some(body) => Overrides::from_json(body.clone()),
        None => Ok(Overrides::new()),
    }
}

/// Map fixture rejections of client input to a 400 instead of aborting.
fn bad_request_on_fixture_error<T>(
    result: Result<T, FixtureError>,
    fulfill: impl FnOnce(T) -> Result<HandlerOutcome, HandlerError>,
) -> Result<HandlerOutcome, HandlerError> {
    match result {
        Ok(value) => fulfill(value),
        Err(e) => HandlerOutcome::error(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}
