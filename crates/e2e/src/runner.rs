//! Harness runner that sweeps the route registry with each test layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::HarnessConfig;
use crate::error::E2eResult;
use crate::layers::{self, LayerContext, LayerKind, LayerResult};
use crate::page::PageFactory;
use crate::registry::{RouteDescriptor, RouteRegistry};
use crate::visual::{VisualConfig, VisualTester};

/// Result of one layer across its routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub layer: LayerKind,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub results: Vec<LayerResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &LayerResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// Runs layers over the registry against pages from a [`PageFactory`]
pub struct HarnessRunner {
    ctx: LayerContext,
}

impl HarnessRunner {
    pub fn new(config: HarnessConfig, registry: RouteRegistry, factory: Arc<dyn PageFactory>) -> Self {
        Self { ctx: LayerContext::new(config, registry, factory) }
    }

    pub fn context(&self) -> &LayerContext {
        &self.ctx
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.ctx.config
    }

    /// Routes a layer visits. RBAC visits each once per denied role.
    pub fn routes_for(&self, layer: LayerKind) -> Vec<&RouteDescriptor> {
        let registry = &self.ctx.registry;
        match layer {
            LayerKind::Crawl | LayerKind::Visual | LayerKind::Accessibility => registry.crawlable_routes(),
            LayerKind::Interaction => registry.filter(|r| !r.public && !r.has_params),
            LayerKind::Responsive => registry.filter(|r| (r.public || r.is_dashboard()) && !r.has_params),
            LayerKind::Rbac => registry.rbac_routes(),
        }
    }

    /// Run one layer across its routes
    pub async fn run_layer(&self, layer: LayerKind) -> E2eResult<SuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::new();

        let routes = self.routes_for(layer);
        info!("Running {} layer over {} route(s)...", layer, routes.len());
        for route in routes {
            for result in layers::run_route(&self.ctx, layer, route).await {
                log_result(&result);
                results.push(result);
            }
        }

        let passed = results.iter().filter(|r| r.passed).count();
        let failed = results.len() - passed;
        let warnings = results.iter().map(|r| r.warnings.len()).sum();
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "{} layer: {} passed, {} failed, {} warning(s) ({} ms)",
            layer, passed, failed, warnings, duration_ms
        );

        Ok(SuiteResult {
            layer,
            total: results.len(),
            passed,
            failed,
            warnings,
            duration_ms,
            started_at,
            results,
        })
    }

    pub async fn run_layers(&self, layers: &[LayerKind]) -> E2eResult<Vec<SuiteResult>> {
        let mut suites = Vec::with_capacity(layers.len());
        for layer in layers {
            suites.push(self.run_layer(*layer).await?);
        }
        Ok(suites)
    }

    pub async fn run_all(&self) -> E2eResult<Vec<SuiteResult>> {
        self.run_layers(&LayerKind::ALL).await
    }

    /// Promote every recorded screenshot to a baseline
    pub fn update_baselines(&self) -> E2eResult<usize> {
        let tester = VisualTester::new(&VisualConfig { auto_update: true, ..self.ctx.config.visual.clone() })?;
        let updated = tester.update_all_baselines()?;
        info!("Updated {} baseline(s)", updated);
        Ok(updated)
    }

    /// Write suite results to JSON
    pub fn write_results(&self, suites: &[SuiteResult]) -> E2eResult<PathBuf> {
        let path = self.ctx.config.results_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(suites)?)?;
        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn log_result(result: &LayerResult) {
    let who = result.role.as_deref().unwrap_or("anonymous");
    if result.passed {
        info!("✓ {} {} as {} ({} ms)", result.layer, result.path, who, result.duration_ms);
        for warning in &result.warnings {
            warn!("  {}", warning);
        }
    } else {
        error!("✗ {} {} as {} - {}", result.layer, result.path, who, result.failures.join("; "));
    }
}
