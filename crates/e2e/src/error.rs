//! Harness errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    // Mock API server and browser bridge
    #[error("mock API server could not start: {0}")]
    ServerStartup(String),

    #[error("mock API server never became healthy ({0} probes)")]
    ServerHealthCheck(usize),

    #[error("playwright is not installed (run `npx playwright install`)")]
    PlaywrightNotFound,

    #[error("playwright script failed: {0}")]
    Playwright(String),

    // Route registry
    #[error("cannot read route extensions: {0}")]
    RegistryParse(String),

    #[error("route {path} rejected: {reason}")]
    InvalidRoute { path: String, reason: String },

    #[error("route {0} is already registered")]
    DuplicateRoute(String),

    // Requests and pages
    #[error("bad request URL {0}")]
    InvalidUrl(String),

    #[error("bad URL glob: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("could not open {path}: {reason}")]
    Navigation { path: String, reason: String },

    #[error("no element matches {0}")]
    ElementNotFound(String),

    #[error("route cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("timed out waiting for {0}")]
    Timeout(String),

    // Layer verdicts
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Screenshot mismatch: {name} differs by {diff_percent:.2}% (threshold {threshold:.2}%)")]
    ScreenshotMismatch { name: String, diff_percent: f64, threshold: f64 },

    #[error("visual baseline error: {0}")]
    VisualRegression(String),

    #[error("no baseline at {0}")]
    BaselineNotFound(String),

    #[error("invalid harness configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("PNG: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Fixture(#[from] serenity_fixtures::FixtureError),
}

pub type E2eResult<T> = Result<T, E2eError>;
