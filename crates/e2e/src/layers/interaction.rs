//! Interaction audit.
//!
//! Every enabled control on a healthy route is clicked once from a clean
//! starting state. A click that changes the URL, the open-dialog count or
//! the toast count within the settle window is functional; anything else is
//! orphaned and reported as a warning.

use std::time::Instant;
use tracing::{debug, info, warn};

use super::{open_healthy, LayerContext, LayerKind, LayerResult, RouteProgress, RouteState};
use crate::error::E2eResult;
use crate::page::{Control, Page};
use crate::registry::RouteDescriptor;
use crate::wait::try_await;

/// The observable state a click may change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signals {
    pub path: String,
    pub dialogs: usize,
    pub toasts: usize,
}

impl Signals {
    pub async fn read(page: &dyn Page) -> E2eResult<Self> {
        Ok(Self {
            path: page.current_path().await?,
            dialogs: page.dialog_count().await?,
            toasts: page.toast_count().await?,
        })
    }
}

pub async fn run(ctx: &LayerContext, route: &RouteDescriptor) -> LayerResult {
    let start = Instant::now();
    let role = ctx.role_for(route);
    let mut result = LayerResult::new(LayerKind::Interaction, route, role.as_deref());
    let mut progress = RouteProgress::default();
    let outcome = interact(ctx, route, role.as_deref(), &mut progress, &mut result).await;
    result.finish(outcome, &progress, start)
}

async fn interact(
    ctx: &LayerContext,
    route: &RouteDescriptor,
    role: Option<&str>,
    progress: &mut RouteProgress,
    result: &mut LayerResult,
) -> E2eResult<()> {
    let (page, path) = open_healthy(ctx, route, role, progress).await?;
    let page = page.as_ref();
    let interaction = &ctx.config.interaction;

    let controls: Vec<Control> = page
        .controls()
        .await?
        .into_iter()
        .filter(|control| !control.disabled)
        .filter(|control| {
            let skip = interaction.skips(&control.label);
            if skip {
                debug!("Skipping '{}' on {}", control.label, path);
            }
            !skip
        })
        .take(interaction.max_controls_per_route)
        .collect();

    for control in &controls {
        reset(page, &path).await?;
        let before = Signals::read(page).await?;

        if let Err(e) = page.click(&control.selector).await {
            warn!("Could not click '{}' on {}: {}", control.label, path, e);
            result.warn(format!("could not click '{}': {}", control.label, e));
            continue;
        }

        let before = &before;
        let changed = try_await(
            || async move { Signals::read(page).await.map_or(false, |now| now != *before) },
            interaction.settle(),
            ctx.config.timeouts.poll(),
        )
        .await;
        progress.advance(RouteState::Interacted)?;

        if changed {
            result.diagnostics.functional_controls.push(control.label.clone());
        } else {
            warn!("Orphaned control '{}' on {}", control.label, path);
            result.diagnostics.orphaned_controls.push(control.label.clone());
            result.warn(format!("orphaned control '{}' ({})", control.label, control.selector));
        }
    }

    info!(
        "{}: {} functional, {} orphaned",
        path,
        result.diagnostics.functional_controls.len(),
        result.diagnostics.orphaned_controls.len()
    );
    progress.advance(RouteState::Done)
}

/// Back on `path` with no dialog open.
async fn reset(page: &dyn Page, path: &str) -> E2eResult<()> {
    if page.current_path().await? != path {
        page.goto(path).await?;
    }
    if page.dialog_count().await? > 0 {
        page.press("Escape").await?;
        if page.dialog_count().await? > 0 {
            page.goto(path).await?;
        }
    }
    Ok(())
}
