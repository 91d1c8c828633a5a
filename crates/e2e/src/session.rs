//! Establishing an authenticated session on a page.
//!
//! Two strategies:
//! - [`AuthStrategy::Direct`] writes the token and user object into client
//!   storage under every key the console may read, then navigates.
//! - [`AuthStrategy::Interactive`] drives the login form against the mocked
//!   auth endpoint and waits for the post-login signal.
//!
//! Both install the mocked backend first and are safe to repeat on a page.
//! A login that never completes is logged and reported through
//! [`SessionOutcome::signed_in`]; asserting on it is the caller's job.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn};

use serenity_common::{Identity, RoleResolution, TEST_PASSWORD};
use serenity_fixtures::auth::{encode_token, login_response_for};

use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};
use crate::mock::mock_all_endpoints;
use crate::page::Page;
use crate::wait::try_await;

/// Storage keys that may hold the access token.
pub const TOKEN_KEYS: [&str; 3] = ["serenity_access_token", "authToken", "token"];
/// Storage keys that may hold the serialized user.
pub const USER_KEYS: [&str; 2] = ["user", "serenity_user"];
pub const REFRESH_TOKEN_KEY: &str = "serenity_refresh_token";

pub const LOGIN_PATH: &str = "/login";
pub const EMAIL_INPUT: &str = r#"input[name="email"]"#;
pub const PASSWORD_INPUT: &str = r#"input[name="password"]"#;
pub const SUBMIT_BUTTON: &str = r#"button[type="submit"]"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStrategy {
    Interactive,
    #[default]
    Direct,
}

impl FromStr for AuthStrategy {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interactive" | "ui" => Ok(AuthStrategy::Interactive),
            "direct" | "storage" => Ok(AuthStrategy::Direct),
            other => Err(E2eError::Config(format!("unknown auth strategy '{}'", other))),
        }
    }
}

/// Tokens and user object for one role.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub resolution: RoleResolution,
    pub identity: Identity,
    pub token: String,
    pub refresh_token: String,
}

impl SessionState {
    pub fn for_role(role: &str) -> Self {
        let resolution = RoleResolution::resolve(role);
        let login = login_response_for(Identity::for_role(resolution.effective()));
        Self {
            resolution,
            identity: login.user,
            token: login.token,
            refresh_token: login.refresh_token,
        }
    }

    /// A fresh access token for the same identity.
    pub fn reissue(&mut self) {
        self.token = encode_token(&self.identity);
    }

    /// Every storage entry a direct login writes.
    pub fn storage_entries(&self) -> E2eResult<Vec<(String, String)>> {
        let user = serde_json::to_string(&self.identity)?;
        let mut entries: Vec<(String, String)> = TOKEN_KEYS
            .iter()
            .map(|key| (key.to_string(), self.token.clone()))
            .collect();
        entries.extend(USER_KEYS.iter().map(|key| (key.to_string(), user.clone())));
        entries.push((REFRESH_TOKEN_KEY.to_string(), self.refresh_token.clone()));
        Ok(entries)
    }
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub resolution: RoleResolution,
    pub identity: Identity,
    pub strategy: AuthStrategy,
    pub signed_in: bool,
}

/// Write the session into storage, then navigate to `target`.
pub async fn login_direct(page: &dyn Page, role: &str, target: &str) -> E2eResult<SessionOutcome> {
    mock_all_endpoints(page).await?;
    let session = SessionState::for_role(role);

    // Storage is per origin; land on it before writing.
    page.goto("/").await?;
    for (key, value) in session.storage_entries()? {
        page.set_storage_item(&key, &value).await?;
    }
    page.goto(target).await?;

    info!("Direct session as {} at {}", session.identity.role, target);
    Ok(SessionOutcome {
        resolution: session.resolution,
        identity: session.identity,
        strategy: AuthStrategy::Direct,
        signed_in: true,
    })
}

/// Drive the login form. Times out softly.
pub async fn login_interactive(page: &dyn Page, role: &str, config: &HarnessConfig) -> E2eResult<SessionOutcome> {
    mock_all_endpoints(page).await?;
    let resolution = RoleResolution::resolve(role);
    let identity = Identity::for_role(resolution.effective());

    page.goto(LOGIN_PATH).await?;
    for (selector, value) in [(EMAIL_INPUT, identity.email.as_str()), (PASSWORD_INPUT, TEST_PASSWORD)] {
        if let Err(e) = page.fill(selector, value).await {
            warn!("Login form: could not fill {}: {}", selector, e);
        }
    }
    if let Err(e) = page.click(SUBMIT_BUTTON).await {
        warn!("Login form: could not submit: {}", e);
    }

    let signed_in = try_await(
        || async move { left_login(page).await },
        config.timeouts.login(),
        config.timeouts.poll(),
    )
    .await;
    if !signed_in {
        warn!(
            "Login as {} did not complete within {} ms; continuing",
            identity.role, config.timeouts.login_ms
        );
    }

    Ok(SessionOutcome { resolution, identity, strategy: AuthStrategy::Interactive, signed_in })
}

/// The login form is gone or the page moved off the login path.
async fn left_login(page: &dyn Page) -> bool {
    let off_login = page.current_path().await.map_or(false, |p| p != LOGIN_PATH);
    let form_gone = !page.is_visible(PASSWORD_INPUT).await.unwrap_or(true);
    off_login || form_gone
}

/// Establish a session with the configured strategy and end up at `target`.
pub async fn establish_session(
    page: &dyn Page,
    role: &str,
    target: &str,
    config: &HarnessConfig,
) -> E2eResult<SessionOutcome> {
    match config.auth_strategy {
        AuthStrategy::Direct => login_direct(page, role, target).await,
        AuthStrategy::Interactive => {
            let outcome = login_interactive(page, role, config).await?;
            if page.current_path().await? != target {
                page.goto(target).await?;
            }
            Ok(outcome)
        }
    }
}

/// Install the mocked backend without signing in, for public routes.
pub async fn anonymous_session(page: &dyn Page, target: &str) -> E2eResult<()> {
    mock_all_endpoints(page).await?;
    page.goto(target).await
}

/// The identity the page currently has stored, if any.
pub async fn stored_identity(page: &dyn Page) -> E2eResult<Option<Identity>> {
    for key in USER_KEYS.iter().rev() {
        if let Some(raw) = page.storage_item(key).await? {
            if let Ok(identity) = serde_json::from_str(&raw) {
                return Ok(Some(identity));
            }
        }
    }
    Ok(None)
}
