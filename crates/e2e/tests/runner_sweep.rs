//! Whole-registry sweeps through the runner.

use std::sync::Arc;

use serenity_e2e::layers::LayerKind;
use serenity_e2e::simulated::{Screen, SimulatedApp};
use serenity_e2e::visual::VisualConfig;
use serenity_e2e::{HarnessConfig, HarnessRunner, RouteRegistry, SuiteResult};
use tempfile::TempDir;

fn runner(app: SimulatedApp, dir: &TempDir) -> HarnessRunner {
    let mut config = HarnessConfig::default();
    config.output_dir = dir.path().to_path_buf();
    config.visual = VisualConfig::under(dir.path());
    config.interaction.settle_ms = 10;
    config.timeouts.element_ms = 100;
    config.timeouts.login_ms = 200;
    config.timeouts.poll_ms = 5;
    HarnessRunner::new(config, RouteRegistry::builtin(), Arc::new(app))
}

#[tokio::test]
async fn test_full_sweep_is_green() {
    let dir = TempDir::new().unwrap();
    let runner = runner(SimulatedApp::default(), &dir);

    let suites = runner.run_all().await.unwrap();
    assert_eq!(suites.len(), LayerKind::ALL.len());
    for suite in &suites {
        let failures: Vec<_> = suite.failures().map(|r| (&r.path, &r.failures)).collect();
        assert!(suite.success(), "{} layer failed: {:?}", suite.layer, failures);
        assert_eq!(suite.total, suite.results.len());
    }
}

#[tokio::test]
async fn test_rbac_covers_denial_matrix() {
    let dir = TempDir::new().unwrap();
    let runner = runner(SimulatedApp::default(), &dir);

    let suite = runner.run_layer(LayerKind::Rbac).await.unwrap();
    let expected = RouteRegistry::builtin().denial_matrix().len();
    assert!(expected > 0);
    assert_eq!(suite.total, expected);
    assert!(suite.results.iter().all(|r| r.role.as_deref() != Some("founder")));
}

#[tokio::test]
async fn test_crawl_failure_is_isolated_to_its_route() {
    let dir = TempDir::new().unwrap();
    let app = SimulatedApp::default().with_screen(Screen::new("/reports", "Reports").crashing());
    let runner = runner(app, &dir);

    let suite = runner.run_layer(LayerKind::Crawl).await.unwrap();
    assert_eq!(suite.failed, 1);
    let failed: Vec<_> = suite.failures().map(|r| r.path.as_str()).collect();
    assert_eq!(failed, vec!["/reports"]);
    assert_eq!(suite.passed, suite.total - 1);
}

#[tokio::test]
async fn test_baseline_update_then_clean_visual_run() {
    let dir = TempDir::new().unwrap();
    let runner = runner(SimulatedApp::default(), &dir);

    let first = runner.run_layer(LayerKind::Visual).await.unwrap();
    assert!(first.success());
    assert!(first.warnings >= first.total);

    let updated = runner.update_baselines().unwrap();
    assert!(updated > 0 && updated <= first.total);

    let second = runner.run_layer(LayerKind::Visual).await.unwrap();
    assert!(second.success());
    assert_eq!(second.warnings, 0);
}

#[tokio::test]
async fn test_results_written_as_json() {
    let dir = TempDir::new().unwrap();
    let runner = runner(SimulatedApp::default(), &dir);

    let suites = runner.run_layers(&[LayerKind::Responsive]).await.unwrap();
    let path = runner.write_results(&suites).unwrap();
    assert_eq!(path, dir.path().join("layer-results.json"));

    let raw = std::fs::read_to_string(&path).unwrap();
    let parsed: Vec<SuiteResult> = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].layer, LayerKind::Responsive);
    assert_eq!(parsed[0].total, suites[0].total);
}
