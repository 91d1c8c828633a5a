//! Serenity E2E Harness
//!
//! Route-coverage and API-mocking harness for the Serenity console:
//! - Intercepts outbound API calls and answers them from fixture generators
//! - Establishes role sessions directly in storage or through the login form
//! - Sweeps a declarative route registry with six test layers
//! - Serves the same mocks over HTTP and drives Playwright for real browsers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HarnessRunner (Rust)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RouteRegistry ──► layers::{crawl, interaction, visual,     │
//! │                             accessibility, responsive,      │
//! │                             rbac}                           │
//! │    for each route:                                          │
//! │      PageFactory::new_page() -> Box<dyn Page>               │
//! │      session::establish_session(page, role, path)           │
//! │        └── mock::mock_all_endpoints(page)                   │
//! │      page.goto(path)                                        │
//! │        └── each request: MockRouter::dispatch               │
//! │              rules in order, Delegate falls through,        │
//! │              catch-all last                                 │
//! │      assert on page state -> LayerResult                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Page implementations                                       │
//! │    ├── simulated::SimulatedApp   (in-memory console)        │
//! │    └── playwright::PlaywrightBridge + server::MockApiServer │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod layers;
pub mod mock;
pub mod page;
pub mod playwright;
pub mod registry;
pub mod runner;
pub mod server;
pub mod session;
pub mod simulated;
pub mod visual;
pub mod wait;

pub use config::HarnessConfig;
pub use error::{E2eError, E2eResult};
pub use layers::{LayerKind, LayerResult};
pub use mock::{mock_all_endpoints, MockRouter, MockRule};
pub use page::{Page, PageFactory};
pub use registry::{RouteDescriptor, RouteRegistry};
pub use runner::{HarnessRunner, SuiteResult};
pub use simulated::SimulatedApp;
