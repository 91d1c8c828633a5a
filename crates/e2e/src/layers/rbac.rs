//! Role denial checks.
//!
//! One case per (route, denied role) pair. Signed in as the denied role, the
//! page must either show a denial marker or leave the target path. The soft
//! wait gives the guard time to act; the assertion afterwards re-reads the
//! same condition and decides.

use std::time::Instant;
use tracing::warn;

use super::{has_denial_marker, LayerContext, LayerKind, LayerResult, RouteProgress, RouteState};
use crate::error::{E2eError, E2eResult};
use crate::page::Page;
use crate::registry::{DenialCase, RouteDescriptor};
use crate::session::establish_session;
use crate::wait::try_await;

pub async fn run_denial(ctx: &LayerContext, case: &DenialCase<'_>) -> LayerResult {
    let start = Instant::now();
    let role = case.role.as_str();
    let mut result = LayerResult::new(LayerKind::Rbac, case.route, Some(role));
    let mut progress = RouteProgress::default();
    let outcome = check_denial(ctx, case.route, role, &mut progress).await;
    result.finish(outcome, &progress, start)
}

async fn check_denial(
    ctx: &LayerContext,
    route: &RouteDescriptor,
    role: &str,
    progress: &mut RouteProgress,
) -> E2eResult<()> {
    let target = route
        .navigable_path()
        .ok_or_else(|| E2eError::InvalidRoute { path: route.path.clone(), reason: "no navigable path".to_string() })?;
    let page = ctx.factory.new_page().await?;
    let page = page.as_ref();

    establish_session(page, role, target, &ctx.config).await?;
    progress.advance(RouteState::Authenticated)?;
    progress.advance(RouteState::Navigated)?;

    let observed = try_await(
        || async move { denial_observed(page, target).await },
        ctx.config.timeouts.element(),
        ctx.config.timeouts.poll(),
    )
    .await;
    if !observed {
        warn!("No denial observed for {} on {} yet", role, target);
    }

    progress.advance(RouteState::HealthChecked)?;
    if !denial_observed(page, target).await {
        return Err(E2eError::AssertionFailed(format!(
            "RBAC: {} reached {} ({}) without denial",
            role, route.name, target
        )));
    }
    progress.advance(RouteState::Done)
}

/// A denial marker is shown, or the guard moved the page elsewhere.
pub async fn denial_observed(page: &dyn Page, target: &str) -> bool {
    let moved = page.current_path().await.map_or(false, |path| path != target);
    let marked = page.text_content().await.map_or(false, |text| has_denial_marker(&text));
    moved || marked
}
