//! Playwright bridge
//!
//! Drives a real browser by generating a Node script, running it, and
//! reading one JSON line per visited route back from stdout. The script
//! reroutes every `/api/**` request to a [`MockApiServer`](crate::server::MockApiServer)
//! and seeds the session storage keys before any page script runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use crate::error::{E2eError, E2eResult};
use crate::layers::HealthReport;
use crate::page::Viewport;
use crate::registry::RouteDescriptor;
use crate::session::SessionState;

/// Prefix of report lines on the script's stdout.
pub const REPORT_PREFIX: &str = "E2E_REPORT ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for the bridge
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Origin the console is served from
    pub base_url: String,

    /// Origin of the mock API server
    pub api_base_url: String,

    pub browser: Browser,
    pub viewport: Viewport,
    pub navigation_timeout_ms: u64,
    pub settle_ms: u64,

    /// Project whose node_modules provides playwright
    pub project_dir: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5173".to_string(),
            api_base_url: "http://127.0.0.1:8787".to_string(),
            browser: Browser::Chromium,
            viewport: Viewport::default(),
            navigation_timeout_ms: 15_000,
            settle_ms: 500,
            project_dir: None,
        }
    }
}

/// One route as the browser saw it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeReport {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub final_path: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BridgeReport {
    pub fn health(&self, min_text_length: usize) -> HealthReport {
        HealthReport::from_text(&self.text, min_text_length)
    }

    pub fn redirected(&self) -> bool {
        self.final_path.as_deref().map_or(false, |p| p != self.path)
    }
}

#[derive(Serialize)]
struct ScriptRoute<'a> {
    name: &'a str,
    path: &'a str,
}

/// Playwright browser bridge
pub struct PlaywrightBridge {
    config: PlaywrightConfig,
}

impl PlaywrightBridge {
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;
        Ok(Self { config })
    }

    /// Check if Playwright is installed
    pub fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Script that visits `routes`, signed in as `session` when given
    pub fn build_crawl_script(&self, session: Option<&SessionState>, routes: &[&RouteDescriptor]) -> E2eResult<String> {
        let storage: serde_json::Map<String, serde_json::Value> = match session {
            Some(session) => session
                .storage_entries()?
                .into_iter()
                .map(|(key, value)| (key, serde_json::Value::String(value)))
                .collect(),
            None => serde_json::Map::new(),
        };
        let routes: Vec<ScriptRoute<'_>> = routes
            .iter()
            .filter_map(|route| {
                let path = route.navigable_path();
                if path.is_none() {
                    warn!("Skipping {}: no param example", route.path);
                }
                path.map(|path| ScriptRoute { name: &route.name, path })
            })
            .collect();

        Ok(format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');

const BASE_URL = {base_url};
const API_BASE_URL = {api_base_url};
const STORAGE = {storage};
const ROUTES = {routes};

(async () => {{
  const browser = await {browser}.launch({{ headless: true }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});

  await context.route('**/api/**', async (route) => {{
    const url = new URL(route.request().url());
    try {{
      const response = await route.fetch({{ url: API_BASE_URL + url.pathname + url.search }});
      await route.fulfill({{ response }});
    }} catch (error) {{
      await route.abort();
    }}
  }});

  await context.addInitScript((entries) => {{
    for (const [key, value] of Object.entries(entries)) {{
      window.localStorage.setItem(key, value);
    }}
  }}, STORAGE);

  for (const route of ROUTES) {{
    const page = await context.newPage();
    const errors = [];
    page.on('pageerror', (error) => errors.push(error.message));
    const report = {{ name: route.name, path: route.path, errors }};
    try {{
      await page.goto(BASE_URL + route.path, {{ waitUntil: 'networkidle', timeout: {nav_timeout} }});
      await page.waitForTimeout({settle});
      report.finalPath = new URL(page.url()).pathname;
      report.text = await page.innerText('body');
    }} catch (error) {{
      report.error = error.message;
    }}
    console.log({prefix} + JSON.stringify(report));
    await page.close();
  }}

  await browser.close();
}})().catch((error) => {{
  console.error(error);
  process.exit(1);
}});
"#,
            base_url = serde_json::to_string(&self.config.base_url)?,
            api_base_url = serde_json::to_string(&self.config.api_base_url)?,
            storage = serde_json::to_string(&storage)?,
            routes = serde_json::to_string(&routes)?,
            browser = self.config.browser.as_str(),
            width = self.config.viewport.width,
            height = self.config.viewport.height,
            nav_timeout = self.config.navigation_timeout_ms,
            settle = self.config.settle_ms,
            prefix = serde_json::to_string(REPORT_PREFIX)?,
        ))
    }

    /// Execute a script with node and return its stdout
    pub async fn run_script(&self, script: &str) -> E2eResult<String> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("crawl.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut command = TokioCommand::new("node");
        command.arg(&script_path).current_dir(temp_dir.path());
        if let Some(project) = &self.config.project_dir {
            command.env("NODE_PATH", project.join("node_modules"));
        }
        let output = command.output().await?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Playwright(format!("Script failed:\nstdout: {}\nstderr: {}", stdout, stderr)));
        }
        Ok(stdout)
    }

    /// Visit `routes` in a real browser
    pub async fn crawl(&self, session: Option<&SessionState>, routes: &[&RouteDescriptor]) -> E2eResult<Vec<BridgeReport>> {
        let script = self.build_crawl_script(session, routes)?;
        let stdout = self.run_script(&script).await?;
        Ok(parse_output(&stdout))
    }
}

/// Report lines from script output. Anything else is ignored.
pub fn parse_output(stdout: &str) -> Vec<BridgeReport> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix(REPORT_PREFIX))
        .filter_map(|json| match serde_json::from_str(json) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Unreadable report line: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> PlaywrightBridge {
        PlaywrightBridge { config: PlaywrightConfig::default() }
    }

    #[test]
    fn test_script_embeds_session_and_routes() {
        let session = SessionState::for_role("founder");
        let patients = RouteDescriptor::new("/patients", "Patients");
        let detail = RouteDescriptor::new("/patients/:id", "Patient \"Detail\"").example("/patients/pat-001");
        let script = bridge().build_crawl_script(Some(&session), &[&patients, &detail]).unwrap();

        assert!(script.contains("chromium.launch"));
        assert!(script.contains("serenity_access_token"));
        assert!(script.contains(&session.token));
        assert!(script.contains(r#""path":"/patients/pat-001""#));
        assert!(script.contains(r#"Patient \"Detail\""#));
        assert!(script.contains("'**/api/**'"));
    }

    #[test]
    fn test_anonymous_script_seeds_nothing() {
        let home = RouteDescriptor::public("/", "Home");
        let script = bridge().build_crawl_script(None, &[&home]).unwrap();
        assert!(script.contains("const STORAGE = {};"));
    }

    #[test]
    fn test_parse_output_skips_noise() {
        let stdout = format!(
            "warming up\n{}{}\n{}{}\nnot json\n{}{{broken\n",
            REPORT_PREFIX,
            r#"{"name":"Patients","path":"/patients","finalPath":"/patients","text":"Patients list with records","errors":[]}"#,
            REPORT_PREFIX,
            r#"{"name":"Users","path":"/admin/users","finalPath":"/dashboard","text":"Dashboard","errors":["boom"]}"#,
            REPORT_PREFIX,
        );
        let reports = parse_output(&stdout);
        assert_eq!(reports.len(), 2);
        assert!(reports[0].health(10).is_healthy());
        assert!(!reports[0].redirected());
        assert!(reports[1].redirected());
        assert_eq!(reports[1].errors, vec!["boom".to_string()]);
    }

    #[test]
    fn test_report_health_uses_oracle() {
        let report = BridgeReport {
            name: "Billing".to_string(),
            path: "/billing".to_string(),
            final_path: Some("/billing".to_string()),
            text: "404\nPage Not Found".to_string(),
            errors: Vec::new(),
            error: None,
        };
        assert!(report.health(10).not_found);
    }
}
