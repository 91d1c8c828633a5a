//! Accessibility audit. Violations at a failing impact fail the route; the
//! rest are warnings.

use std::time::Instant;

use super::{open_healthy, LayerContext, LayerKind, LayerResult, RouteProgress, RouteState};
use crate::error::E2eResult;
use crate::registry::RouteDescriptor;

pub async fn run(ctx: &LayerContext, route: &RouteDescriptor) -> LayerResult {
    let start = Instant::now();
    let role = ctx.role_for(route);
    let mut result = LayerResult::new(LayerKind::Accessibility, route, role.as_deref());
    let mut progress = RouteProgress::default();
    let outcome = audit(ctx, route, role.as_deref(), &mut progress, &mut result).await;
    result.finish(outcome, &progress, start)
}

async fn audit(
    ctx: &LayerContext,
    route: &RouteDescriptor,
    role: Option<&str>,
    progress: &mut RouteProgress,
    result: &mut LayerResult,
) -> E2eResult<()> {
    let (page, path) = open_healthy(ctx, route, role, progress).await?;
    let violations = page.accessibility_scan().await?;

    for violation in &violations {
        let message = format!(
            "{} ({:?}, {} nodes): {}",
            violation.id, violation.impact, violation.nodes, violation.description
        );
        if ctx.config.accessibility.fails(violation.impact) {
            result.fail(format!("{} ({}) {}", route.name, path, message));
        } else {
            result.warn(message);
        }
    }
    result.diagnostics.a11y_violations = violations;
    progress.advance(RouteState::Done)
}
