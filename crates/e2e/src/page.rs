//! The browser-page surface the harness drives.
//!
//! Everything the layers need from a browser goes through [`Page`], so the
//! same drivers run against the in-process [`crate::simulated::SimulatedApp`]
//! or any other engine that implements the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;
use crate::mock::MockRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1440, height: 900 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedViewport {
    pub name: String,
    #[serde(flatten)]
    pub viewport: Viewport,
}

impl NamedViewport {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self { name: name.to_string(), viewport: Viewport::new(width, height) }
    }
}

impl std::fmt::Display for NamedViewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}x{})", self.name, self.viewport.width, self.viewport.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Button,
    Link,
    MenuItem,
    Tab,
}

/// A clickable element found on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub selector: String,
    pub label: String,
    pub kind: ControlKind,
    /// In-app target for links.
    pub href: Option<String>,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct A11yViolation {
    pub id: String,
    pub impact: Impact,
    pub description: String,
    pub nodes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMetrics {
    pub viewport_width: u32,
    pub scroll_width: u32,
}

impl LayoutMetrics {
    pub fn overflows(&self) -> bool {
        self.scroll_width > self.viewport_width
    }
}

/// How one outgoing request was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NetworkOutcome {
    Fulfilled { rule: String, status: u16 },
    Aborted { rule: String, reason: String },
    /// No route intercepted the request.
    Unrouted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEvent {
    pub method: String,
    pub url: String,
    #[serde(flatten)]
    pub outcome: NetworkOutcome,
}

#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, path: &str) -> E2eResult<()>;

    /// Current path, without query or fragment.
    async fn current_path(&self) -> E2eResult<String>;

    /// Intercept matching requests. Rules are evaluated in registration order.
    async fn route(&self, rule: MockRule) -> E2eResult<()>;

    /// Intercept requests no other rule fulfilled. Always evaluated last.
    async fn route_fallback(&self, rule: MockRule) -> E2eResult<()>;

    async fn set_storage_item(&self, key: &str, value: &str) -> E2eResult<()>;
    async fn storage_item(&self, key: &str) -> E2eResult<Option<String>>;

    /// Visible text of the document body.
    async fn text_content(&self) -> E2eResult<String>;

    async fn is_visible(&self, selector: &str) -> E2eResult<bool>;
    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()>;
    async fn click(&self, selector: &str) -> E2eResult<()>;
    async fn press(&self, key: &str) -> E2eResult<()>;

    /// Visible buttons, links, menu items and tabs, in document order.
    async fn controls(&self) -> E2eResult<Vec<Control>>;

    async fn dialog_count(&self) -> E2eResult<usize>;
    async fn toast_count(&self) -> E2eResult<usize>;

    async fn set_viewport(&self, viewport: Viewport) -> E2eResult<()>;
    async fn layout_metrics(&self) -> E2eResult<LayoutMetrics>;

    /// PNG-encoded capture of the viewport.
    async fn screenshot(&self) -> E2eResult<Vec<u8>>;

    async fn accessibility_scan(&self) -> E2eResult<Vec<A11yViolation>>;

    /// Uncaught script errors since the page was opened.
    async fn page_errors(&self) -> E2eResult<Vec<String>>;

    async fn network_log(&self) -> E2eResult<Vec<NetworkEvent>>;
}

/// Opens pages in fresh, isolated contexts: no routes, empty storage.
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_viewport_yaml() {
        let viewport: NamedViewport = serde_yaml::from_str("name: mobile\nwidth: 375\nheight: 667\n").unwrap();
        assert_eq!(viewport, NamedViewport::new("mobile", 375, 667));
        assert_eq!(viewport.to_string(), "mobile (375x667)");
    }

    #[test]
    fn test_impact_ordering() {
        assert!(Impact::Critical > Impact::Serious);
        assert!(Impact::Minor < Impact::Moderate);
    }
}
