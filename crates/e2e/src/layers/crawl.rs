//! Functional crawl: visit a route, run the health oracle, and record what
//! the page did on the network.

use std::time::Instant;
use tracing::{debug, warn};

use super::{
    assert_healthy, check_health, open_route, Diagnostics, LayerContext, LayerKind, LayerResult, RouteProgress,
    RouteState,
};
use crate::error::E2eResult;
use crate::mock::CATCH_ALL_RULE;
use crate::page::{NetworkOutcome, Page};
use crate::registry::{RouteDescriptor, RouteRegistry};

pub async fn run(ctx: &LayerContext, route: &RouteDescriptor) -> LayerResult {
    let start = Instant::now();
    let role = ctx.role_for(route);
    let mut result = LayerResult::new(LayerKind::Crawl, route, role.as_deref());
    let mut progress = RouteProgress::default();
    let outcome = crawl(ctx, route, role.as_deref(), &mut progress, &mut result).await;
    result.finish(outcome, &progress, start)
}

async fn crawl(
    ctx: &LayerContext,
    route: &RouteDescriptor,
    role: Option<&str>,
    progress: &mut RouteProgress,
    result: &mut LayerResult,
) -> E2eResult<()> {
    let (page, path) = open_route(ctx, route, role, progress).await?;
    record_traffic(page.as_ref(), &mut result.diagnostics).await?;
    let report = check_health(page.as_ref(), ctx.config.min_text_length).await?;
    progress.advance(RouteState::HealthChecked)?;

    for endpoint in &result.diagnostics.unmodeled_endpoints {
        result.warnings.push(format!("unmodeled endpoint {}", endpoint));
    }
    for request in &result.diagnostics.aborted_requests {
        result.warnings.push(format!("request failed: {}", request));
    }

    result.diagnostics.broken_links = broken_links(page.as_ref(), &ctx.registry).await?;
    for href in result.diagnostics.broken_links.clone() {
        warn!("Broken link on {}: {}", path, href);
        result.fail(format!("{} ({}) links to unknown route {}", route.name, path, href));
    }

    assert_healthy(&report, route)?;
    debug!("Crawled {} ({} warnings)", path, result.warnings.len());
    progress.advance(RouteState::Done)
}

/// Copy catch-all hits, failed requests and page errors into `diagnostics`.
pub(crate) async fn record_traffic(page: &dyn Page, diagnostics: &mut Diagnostics) -> E2eResult<()> {
    for event in page.network_log().await? {
        let request = format!("{} {}", event.method, event.url);
        match event.outcome {
            NetworkOutcome::Fulfilled { rule, .. } if rule == CATCH_ALL_RULE => {
                diagnostics.unmodeled_endpoints.push(request)
            }
            NetworkOutcome::Fulfilled { .. } => {}
            NetworkOutcome::Aborted { reason, .. } => diagnostics.aborted_requests.push(format!("{} ({})", request, reason)),
            NetworkOutcome::Unrouted => diagnostics.aborted_requests.push(format!("{} (no route)", request)),
        }
    }
    diagnostics.page_errors = page.page_errors().await?;
    Ok(())
}

/// Internal hrefs on the page that resolve to no registry route.
pub async fn broken_links(page: &dyn Page, registry: &RouteRegistry) -> E2eResult<Vec<String>> {
    let mut broken: Vec<String> = page
        .controls()
        .await?
        .into_iter()
        .filter_map(|control| control.href)
        .filter(|href| href.starts_with('/') && registry.matches(href).is_none())
        .collect();
    broken.sort();
    broken.dedup();
    Ok(broken)
}
