//! Responsive layout: re-render the route at each configured viewport and
//! check health plus horizontal overflow.

use std::time::Instant;
use tracing::warn;

use super::{check_health, open_route, LayerContext, LayerKind, LayerResult, RouteProgress, RouteState};
use crate::error::E2eResult;
use crate::registry::RouteDescriptor;

pub async fn run(ctx: &LayerContext, route: &RouteDescriptor) -> LayerResult {
    let start = Instant::now();
    let role = ctx.role_for(route);
    let mut result = LayerResult::new(LayerKind::Responsive, route, role.as_deref());
    let mut progress = RouteProgress::default();
    let outcome = sweep(ctx, route, role.as_deref(), &mut progress, &mut result).await;
    result.finish(outcome, &progress, start)
}

async fn sweep(
    ctx: &LayerContext,
    route: &RouteDescriptor,
    role: Option<&str>,
    progress: &mut RouteProgress,
    result: &mut LayerResult,
) -> E2eResult<()> {
    let (page, path) = open_route(ctx, route, role, progress).await?;

    for named in &ctx.config.viewports {
        page.set_viewport(named.viewport).await?;
        page.goto(&path).await?;

        let report = check_health(page.as_ref(), ctx.config.min_text_length).await?;
        if !report.is_healthy() {
            result.fail(format!("{} ({}) at {}: {}", route.name, path, named, report.problems().join(", ")));
        }

        let metrics = page.layout_metrics().await?;
        if metrics.overflows() {
            warn!("{} overflows horizontally at {}", path, named);
            result.diagnostics.overflowing_viewports.push(named.name.clone());
            result.fail(format!(
                "{} ({}) overflows at {}: scroll width {} > viewport {}",
                route.name, path, named, metrics.scroll_width, metrics.viewport_width
            ));
        }
    }

    progress.advance(RouteState::HealthChecked)?;
    progress.advance(RouteState::Done)
}
