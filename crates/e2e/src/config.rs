//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::page::{Impact, NamedViewport};
use crate::session::AuthStrategy;
use crate::visual::VisualConfig;

pub const ENV_BASE_URL: &str = "SERENITY_E2E_BASE_URL";
pub const ENV_TEST_ROLE: &str = "SERENITY_E2E_TEST_ROLE";
pub const ENV_AUTH_STRATEGY: &str = "SERENITY_E2E_AUTH_STRATEGY";
pub const ENV_OUTPUT_DIR: &str = "SERENITY_E2E_OUTPUT_DIR";

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Origin the console is served from
    pub base_url: String,

    /// Role to sign in as when a route does not require a specific one
    pub test_role: String,

    /// How sessions are established
    pub auth_strategy: AuthStrategy,

    /// Minimum visible body text for a page to count as rendered
    pub min_text_length: usize,

    /// Directory for results, screenshots and diffs
    pub output_dir: PathBuf,

    /// Directory of YAML route extensions, if any
    pub registry_extensions: Option<PathBuf>,

    pub timeouts: TimeoutConfig,
    pub visual: VisualConfig,
    pub accessibility: AccessibilityConfig,
    pub interaction: InteractionConfig,
    pub viewports: Vec<NamedViewport>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5173".to_string(),
            test_role: "founder".to_string(),
            auth_strategy: AuthStrategy::Direct,
            min_text_length: 10,
            output_dir: PathBuf::from("test-results"),
            registry_extensions: None,
            timeouts: TimeoutConfig::default(),
            visual: VisualConfig::default(),
            accessibility: AccessibilityConfig::default(),
            interaction: InteractionConfig::default(),
            viewports: vec![
                NamedViewport::new("mobile", 375, 667),
                NamedViewport::new("tablet", 768, 1024),
                NamedViewport::new("desktop", 1440, 900),
            ],
        }
    }
}

/// Timeouts, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub navigation_ms: u64,
    pub element_ms: u64,
    pub login_ms: u64,
    pub poll_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation_ms: 15_000,
            element_ms: 5_000,
            login_ms: 10_000,
            poll_ms: 50,
        }
    }
}

impl TimeoutConfig {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }

    pub fn login(&self) -> Duration {
        Duration::from_millis(self.login_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessibilityConfig {
    /// Violations at these impact levels fail the route
    pub fail_on: Vec<Impact>,
}

impl Default for AccessibilityConfig {
    fn default() -> Self {
        Self { fail_on: vec![Impact::Critical, Impact::Serious] }
    }
}

impl AccessibilityConfig {
    pub fn fails(&self, impact: Impact) -> bool {
        self.fail_on.contains(&impact)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Upper bound on controls exercised per route
    pub max_controls_per_route: usize,

    /// How long a click gets to produce an observable effect
    pub settle_ms: u64,

    /// Controls whose label contains any of these are never clicked
    pub skip_labels: Vec<String>,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            max_controls_per_route: 25,
            settle_ms: 500,
            skip_labels: vec!["Logout".to_string(), "Sign out".to_string(), "Delete".to_string()],
        }
    }
}

impl InteractionConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn skips(&self, label: &str) -> bool {
        let label = label.to_ascii_lowercase();
        self.skip_labels.iter().any(|s| label.contains(&s.to_ascii_lowercase()))
    }
}

impl HarnessConfig {
    /// Load configuration from file, then apply environment overrides
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(role) = lookup(ENV_TEST_ROLE) {
            self.test_role = role;
        }
        if let Some(strategy) = lookup(ENV_AUTH_STRATEGY) {
            self.auth_strategy = strategy.parse()?;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Results file for a run
    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join("layer-results.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.test_role, "founder");
        assert_eq!(config.auth_strategy, AuthStrategy::Direct);
        assert_eq!(config.viewports.len(), 3);
        assert!(config.accessibility.fails(Impact::Critical));
        assert!(!config.accessibility.fails(Impact::Minor));
    }

    #[test]
    fn test_partial_toml() {
        let config: HarnessConfig = toml::from_str(
            r#"
test_role = "caregiver"
auth_strategy = "interactive"

[timeouts]
navigation_ms = 2000
"#,
        )
        .unwrap();
        assert_eq!(config.test_role, "caregiver");
        assert_eq!(config.auth_strategy, AuthStrategy::Interactive);
        assert_eq!(config.timeouts.navigation(), Duration::from_secs(2));
        assert_eq!(config.timeouts.element_ms, 5_000);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = HarnessConfig::default();
        config
            .apply_env(|key| match key {
                ENV_TEST_ROLE => Some("billing_manager".to_string()),
                ENV_AUTH_STRATEGY => Some("interactive".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.test_role, "billing_manager");
        assert_eq!(config.auth_strategy, AuthStrategy::Interactive);
        assert_eq!(config.base_url, "http://127.0.0.1:5173");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.min_text_length, 10);
    }

    #[test]
    fn test_skip_labels() {
        let interaction = InteractionConfig::default();
        assert!(interaction.skips("Sign Out"));
        assert!(!interaction.skips("Refresh"));
    }
}
