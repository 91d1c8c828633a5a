//! Visual regression: capture the route and diff it against its baseline.

use std::time::Instant;
use tracing::info;

use super::{open_healthy, LayerContext, LayerKind, LayerResult, RouteProgress, RouteState};
use crate::error::{E2eError, E2eResult};
use crate::page::Viewport;
use crate::registry::RouteDescriptor;
use crate::visual::VisualTester;

pub async fn run(ctx: &LayerContext, route: &RouteDescriptor) -> LayerResult {
    let start = Instant::now();
    let role = ctx.role_for(route);
    let mut result = LayerResult::new(LayerKind::Visual, route, role.as_deref());
    let mut progress = RouteProgress::default();
    let outcome = snapshot(ctx, route, role.as_deref(), &mut progress, &mut result).await;
    result.finish(outcome, &progress, start)
}

async fn snapshot(
    ctx: &LayerContext,
    route: &RouteDescriptor,
    role: Option<&str>,
    progress: &mut RouteProgress,
    result: &mut LayerResult,
) -> E2eResult<()> {
    let (page, path) = open_healthy(ctx, route, role, progress).await?;
    page.set_viewport(Viewport::default()).await?;
    let png = page.screenshot().await?;

    let tester = VisualTester::new(&ctx.config.visual)?;
    let name = route.slug();
    match tester.check(&name, &png, None) {
        Ok(diff) => {
            result.diagnostics.pixel_diff_percent = Some(diff.diff_percent);
            if diff.baseline_created {
                result.warn(format!("baseline created for {}", name));
            }
            if !diff.matches {
                let mismatch = E2eError::ScreenshotMismatch {
                    name: format!("{} ({})", route.name, path),
                    diff_percent: diff.diff_percent,
                    threshold: tester.threshold(),
                };
                result.fail(mismatch.to_string());
            }
        }
        Err(E2eError::BaselineNotFound(baseline)) => {
            info!("No baseline for '{}' - run with --update-baselines to create {}", name, baseline);
            result.warn(format!("no baseline for {}", name));
        }
        Err(e) => return Err(e),
    }
    progress.advance(RouteState::Done)
}
