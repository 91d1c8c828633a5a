//! Test layers.
//!
//! Each layer is one procedure applied to every route it selects from the
//! registry. A driver never returns an error: whatever goes wrong lands in
//! the [`LayerResult`] for that route, so one broken page cannot stop the
//! sweep.

pub mod accessibility;
pub mod crawl;
pub mod interaction;
pub mod rbac;
pub mod responsive;
pub mod visual;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};
use crate::page::{A11yViolation, Page, PageFactory};
use crate::registry::{DenialCase, RouteDescriptor, RouteRegistry};
use crate::session::{anonymous_session, establish_session};

/// Text that marks a not-found page.
pub const NOT_FOUND_MARKERS: [&str; 2] = ["404", "Page Not Found"];
/// Text that marks a rendered error boundary.
pub const ERROR_BOUNDARY_MARKERS: [&str; 3] =
    ["Something went wrong", "Application error", "Unexpected Application Error"];
/// Text that marks a role guard refusing the viewer.
pub const DENIAL_MARKERS: [&str; 5] = ["Access Denied", "Unauthorized", "403", "Forbidden", "do not have permission"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Crawl,
    Interaction,
    Visual,
    Accessibility,
    Responsive,
    Rbac,
}

impl LayerKind {
    pub const ALL: [LayerKind; 6] = [
        LayerKind::Crawl,
        LayerKind::Interaction,
        LayerKind::Visual,
        LayerKind::Accessibility,
        LayerKind::Responsive,
        LayerKind::Rbac,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Crawl => "crawl",
            LayerKind::Interaction => "interaction",
            LayerKind::Visual => "visual",
            LayerKind::Accessibility => "accessibility",
            LayerKind::Responsive => "responsive",
            LayerKind::Rbac => "rbac",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        LayerKind::ALL
            .into_iter()
            .find(|layer| layer.as_str() == s || (s == "a11y" && *layer == LayerKind::Accessibility))
            .ok_or_else(|| E2eError::Config(format!("unknown layer '{}'", s)))
    }
}

/// How far a route got through a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    NotVisited,
    Authenticated,
    Navigated,
    HealthChecked,
    Interacted,
    Done,
}

impl RouteState {
    pub fn can_advance_to(self, next: RouteState) -> bool {
        use RouteState::*;
        matches!(
            (self, next),
            (NotVisited, Authenticated)
                | (Authenticated, Navigated)
                | (Navigated, HealthChecked)
                | (HealthChecked, Interacted)
                | (Interacted, Interacted)
                | (HealthChecked, Done)
                | (Interacted, Done)
        )
    }
}

#[derive(Debug, Clone)]
pub struct RouteProgress {
    state: RouteState,
}

impl Default for RouteProgress {
    fn default() -> Self {
        Self { state: RouteState::NotVisited }
    }
}

impl RouteProgress {
    pub fn state(&self) -> RouteState {
        self.state
    }

    pub fn advance(&mut self, next: RouteState) -> E2eResult<()> {
        if !self.state.can_advance_to(next) {
            return Err(E2eError::InvalidTransition {
                from: format!("{:?}", self.state),
                to: format!("{:?}", next),
            });
        }
        self.state = next;
        Ok(())
    }
}

/// The three-part health oracle for a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub not_found: bool,
    pub error_boundary: bool,
    pub text_length: usize,
    pub min_text_length: usize,
}

impl HealthReport {
    pub fn from_text(text: &str, min_text_length: usize) -> Self {
        Self {
            not_found: contains_any(text, &NOT_FOUND_MARKERS),
            error_boundary: contains_any(text, &ERROR_BOUNDARY_MARKERS),
            text_length: text.trim().chars().count(),
            min_text_length,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.problems().is_empty()
    }

    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.not_found {
            problems.push("404 marker present".to_string());
        }
        if self.error_boundary {
            problems.push("error boundary rendered".to_string());
        }
        if self.text_length <= self.min_text_length {
            problems.push(format!(
                "rendered text too short ({} <= {} chars)",
                self.text_length, self.min_text_length
            ));
        }
        problems
    }
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| text.contains(marker))
}

pub fn has_denial_marker(text: &str) -> bool {
    contains_any(text, &DENIAL_MARKERS)
}

pub async fn check_health(page: &dyn Page, min_text_length: usize) -> E2eResult<HealthReport> {
    Ok(HealthReport::from_text(&page.text_content().await?, min_text_length))
}

pub fn assert_healthy(report: &HealthReport, route: &RouteDescriptor) -> E2eResult<()> {
    if report.is_healthy() {
        return Ok(());
    }
    Err(E2eError::AssertionFailed(format!(
        "{} ({}) is unhealthy: {}",
        route.name,
        route.path,
        report.problems().join(", ")
    )))
}

/// Detail gathered while checking one route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub broken_links: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aborted_requests: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmodeled_endpoints: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub page_errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functional_controls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orphaned_controls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub a11y_violations: Vec<A11yViolation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_diff_percent: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overflowing_viewports: Vec<String>,
}

/// Outcome of one layer on one route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerResult {
    pub layer: LayerKind,
    pub route_name: String,
    pub path: String,
    pub role: Option<String>,
    pub passed: bool,
    pub state: RouteState,
    pub failures: Vec<String>,
    pub warnings: Vec<String>,
    pub diagnostics: Diagnostics,
    pub duration_ms: u64,
}

impl LayerResult {
    pub fn new(layer: LayerKind, route: &RouteDescriptor, role: Option<&str>) -> Self {
        Self {
            layer,
            route_name: route.name.clone(),
            path: route.navigable_path().unwrap_or(&route.path).to_string(),
            role: role.map(str::to_string),
            passed: true,
            state: RouteState::NotVisited,
            failures: Vec::new(),
            warnings: Vec::new(),
            diagnostics: Diagnostics::default(),
            duration_ms: 0,
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
        self.passed = false;
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold a driver's outcome into the result.
    pub fn finish(mut self, outcome: E2eResult<()>, progress: &RouteProgress, start: Instant) -> Self {
        if let Err(e) = outcome {
            self.fail(e.to_string());
        }
        self.state = progress.state();
        self.duration_ms = start.elapsed().as_millis() as u64;
        self
    }
}

/// Everything a driver needs to check a route.
#[derive(Clone)]
pub struct LayerContext {
    pub config: HarnessConfig,
    pub registry: RouteRegistry,
    pub factory: Arc<dyn PageFactory>,
}

impl LayerContext {
    pub fn new(config: HarnessConfig, registry: RouteRegistry, factory: Arc<dyn PageFactory>) -> Self {
        Self { config, registry, factory }
    }

    /// The role a route is visited as: its required role, else the test role.
    pub fn role_for(&self, route: &RouteDescriptor) -> Option<String> {
        if route.public {
            return None;
        }
        Some(
            route
                .required_role
                .map(|role| role.as_str().to_string())
                .unwrap_or_else(|| self.config.test_role.clone()),
        )
    }
}

/// A fresh page with a session for `route`, already navigated there.
pub async fn open_route(
    ctx: &LayerContext,
    route: &RouteDescriptor,
    role: Option<&str>,
    progress: &mut RouteProgress,
) -> E2eResult<(Box<dyn Page>, String)> {
    let path = route
        .navigable_path()
        .ok_or_else(|| E2eError::InvalidRoute { path: route.path.clone(), reason: "no navigable path".to_string() })?
        .to_string();
    let page = ctx.factory.new_page().await?;
    match role {
        Some(role) => {
            establish_session(page.as_ref(), role, &path, &ctx.config).await?;
        }
        None => anonymous_session(page.as_ref(), &path).await?,
    }
    progress.advance(RouteState::Authenticated)?;
    progress.advance(RouteState::Navigated)?;
    Ok((page, path))
}

/// Open `route`, then run the health oracle and record it.
pub(crate) async fn open_healthy(
    ctx: &LayerContext,
    route: &RouteDescriptor,
    role: Option<&str>,
    progress: &mut RouteProgress,
) -> E2eResult<(Box<dyn Page>, String)> {
    let (page, path) = open_route(ctx, route, role, progress).await?;
    let report = check_health(page.as_ref(), ctx.config.min_text_length).await?;
    progress.advance(RouteState::HealthChecked)?;
    assert_healthy(&report, route)?;
    Ok((page, path))
}

/// Run `layer` on one route. RBAC yields one result per denied role.
pub async fn run_route(ctx: &LayerContext, layer: LayerKind, route: &RouteDescriptor) -> Vec<LayerResult> {
    match layer {
        LayerKind::Crawl => vec![crawl::run(ctx, route).await],
        LayerKind::Interaction => vec![interaction::run(ctx, route).await],
        LayerKind::Visual => vec![visual::run(ctx, route).await],
        LayerKind::Accessibility => vec![accessibility::run(ctx, route).await],
        LayerKind::Responsive => vec![responsive::run(ctx, route).await],
        LayerKind::Rbac => {
            let mut results = Vec::with_capacity(route.denied_roles.len());
            for role in &route.denied_roles {
                results.push(rbac::run_denial(ctx, &DenialCase { route, role: *role }).await);
            }
            results
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("404\nPage Not Found", false; "not found")]
    #[test_case("Something went wrong\nTry again later please", false; "error boundary")]
    #[test_case("Short", false; "too short")]
    #[test_case("Serenity Care | Patients\nShowing 25 records", true; "healthy")]
    fn test_health_oracle(text: &str, healthy: bool) {
        assert_eq!(HealthReport::from_text(text, 10).is_healthy(), healthy);
    }

    #[test]
    fn test_exactly_min_length_is_unhealthy() {
        assert!(!HealthReport::from_text("0123456789", 10).is_healthy());
        assert!(HealthReport::from_text("0123456789A", 10).is_healthy());
    }

    #[test]
    fn test_route_state_transitions() {
        let mut progress = RouteProgress::default();
        progress.advance(RouteState::Authenticated).unwrap();
        progress.advance(RouteState::Navigated).unwrap();
        assert!(progress.advance(RouteState::Done).is_err());
        progress.advance(RouteState::HealthChecked).unwrap();
        progress.advance(RouteState::Interacted).unwrap();
        progress.advance(RouteState::Interacted).unwrap();
        progress.advance(RouteState::Done).unwrap();
        assert!(progress.advance(RouteState::Authenticated).is_err());
    }

    #[test]
    fn test_assertion_names_route() {
        let route = RouteDescriptor::new("/billing", "Billing");
        let err = assert_healthy(&HealthReport::from_text("404", 10), &route).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Billing"));
        assert!(message.contains("/billing"));
    }

    #[test]
    fn test_layer_parse() {
        assert_eq!("RBAC".parse::<LayerKind>().unwrap(), LayerKind::Rbac);
        assert_eq!("a11y".parse::<LayerKind>().unwrap(), LayerKind::Accessibility);
        assert!("smoke".parse::<LayerKind>().is_err());
    }

    #[test]
    fn test_denial_markers() {
        assert!(has_denial_marker("Access Denied\nYou do not have permission"));
        assert!(!has_denial_marker("Users\nShowing 25 records"));
    }
}
