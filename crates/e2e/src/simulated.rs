//! An in-memory stand-in for the console, implementing [`Page`].
//!
//! Screens are built from the route registry. Navigation behaves like the
//! real single-page app: protected screens verify the stored token through
//! `/api/auth/me`, role guards render an access-denied view (or redirect),
//! data is loaded through whatever routes are installed on the page, and any
//! failed load renders the error boundary. Nothing reaches a network: a
//! request no rule intercepts fails the same way a refused connection would.

use async_trait::async_trait;
use axum::http::Method;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use parking_lot::Mutex;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

use serenity_common::{Identity, Role};
use serenity_fixtures::auth::LoginResponse;

use crate::error::{E2eError, E2eResult};
use crate::mock::{Dispatch, MockRequest, MockRouter, MockRule};
use crate::page::{
    A11yViolation, Control, ControlKind, LayoutMetrics, NetworkEvent, NetworkOutcome, Page, PageFactory,
    Viewport,
};
use crate::registry::{RouteDescriptor, RouteRegistry};
use crate::session::{EMAIL_INPUT, LOGIN_PATH, PASSWORD_INPUT, SUBMIT_BUTTON, TOKEN_KEYS};

pub const APP_NAME: &str = "Serenity Care";
pub const NOT_FOUND_TEXT: &str = "404\nPage Not Found\nThe page you are looking for does not exist.";
pub const ACCESS_DENIED_TEXT: &str = "Access Denied\nYou do not have permission to view this page.";
pub const ERROR_BOUNDARY_TEXT: &str =
    "Something went wrong\nAn unexpected error occurred while loading this page. Please try again.";

const MAX_REDIRECTS: u8 = 5;
const SESSION_USER_KEY: &str = "serenity_user";
const SESSION_TOKEN_KEY: &str = "serenity_access_token";
const DIALOG_CLOSE: &str = r#"[data-testid="dialog-close"]"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEffect {
    Navigate(String),
    OpenDialog,
    CloseDialog,
    ShowToast,
    /// Send a request built from the filled fields, then toast the result.
    CallApi { method: Method, path: String },
    SubmitLogin,
    /// Renders but does nothing.
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimControl {
    pub selector: String,
    pub label: String,
    pub kind: ControlKind,
    pub effect: ControlEffect,
    pub disabled: bool,
}

impl SimControl {
    pub fn button(selector: &str, label: &str, effect: ControlEffect) -> Self {
        Self {
            selector: selector.to_string(),
            label: label.to_string(),
            kind: ControlKind::Button,
            effect,
            disabled: false,
        }
    }

    pub fn link(label: &str, href: &str) -> Self {
        Self {
            selector: format!(r#"a[href="{}"]"#, href),
            label: label.to_string(),
            kind: ControlKind::Link,
            effect: ControlEffect::Navigate(href.to_string()),
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    fn to_control(&self) -> Control {
        Control {
            selector: self.selector.clone(),
            label: self.label.clone(),
            kind: self.kind,
            href: match &self.effect {
                ControlEffect::Navigate(href) => Some(href.clone()),
                _ => None,
            },
            disabled: self.disabled,
        }
    }
}

/// One renderable screen of the console.
#[derive(Debug, Clone)]
pub struct Screen {
    /// Path pattern, `:name` segments match anything.
    pub pattern: String,
    pub title: String,
    pub body: String,
    pub public: bool,
    pub denied_roles: BTreeSet<Role>,
    /// GET requests issued on load. `{id}` is replaced with the path parameter.
    pub api_calls: Vec<String>,
    pub controls: Vec<SimControl>,
    pub fields: Vec<String>,
    pub min_content_width: u32,
    pub violations: Vec<A11yViolation>,
    /// Throws during render.
    pub crashes: bool,
}

impl Screen {
    pub fn new(pattern: &str, title: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            title: title.to_string(),
            body: format!("{} workspace. Review, filter and act on the latest records.", title),
            public: false,
            denied_roles: BTreeSet::new(),
            api_calls: Vec::new(),
            controls: Vec::new(),
            fields: Vec::new(),
            min_content_width: 320,
            violations: Vec::new(),
            crashes: false,
        }
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn deny(mut self, roles: &[Role]) -> Self {
        self.denied_roles.extend(roles.iter().copied());
        self
    }

    pub fn with_api_call(mut self, path: &str) -> Self {
        self.api_calls.push(path.to_string());
        self
    }

    pub fn with_control(mut self, control: SimControl) -> Self {
        self.controls.push(control);
        self
    }

    pub fn with_field(mut self, selector: &str) -> Self {
        self.fields.push(selector.to_string());
        self
    }

    pub fn with_min_width(mut self, width: u32) -> Self {
        self.min_content_width = width;
        self
    }

    pub fn with_violation(mut self, violation: A11yViolation) -> Self {
        self.violations.push(violation);
        self
    }

    pub fn crashing(mut self) -> Self {
        self.crashes = true;
        self
    }

    fn matches(&self, path: &str) -> bool {
        let pattern: Vec<&str> = self.pattern.split('/').filter(|s| !s.is_empty()).collect();
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        pattern.len() == actual.len() && pattern.iter().zip(&actual).all(|(p, a)| p.starts_with(':') || p == a)
    }

    /// Value of the first `:param` segment in `path`.
    fn param_value<'a>(&self, path: &'a str) -> Option<&'a str> {
        self.pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .zip(path.split('/').filter(|s| !s.is_empty()))
            .find(|(p, _)| p.starts_with(':'))
            .map(|(_, a)| a)
    }
}

/// What a role guard does when it refuses a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialBehavior {
    Render,
    Redirect(String),
}

#[derive(Debug, Clone)]
struct AppModel {
    screens: Vec<Screen>,
    denial: DenialBehavior,
}

/// The console model. Cheap to clone; pages share it.
#[derive(Debug, Clone)]
pub struct SimulatedApp {
    model: Arc<AppModel>,
}

impl SimulatedApp {
    pub fn new() -> Self {
        Self { model: Arc::new(AppModel { screens: Vec::new(), denial: DenialBehavior::Render }) }
    }

    /// One screen per registry route, plus the login screen.
    pub fn from_registry(registry: &RouteRegistry) -> Self {
        let mut app = Self::new();
        for route in registry.routes() {
            app = app.with_screen(screen_for(route, registry));
        }
        app
    }

    /// Add a screen, replacing any with the same pattern.
    pub fn with_screen(mut self, screen: Screen) -> Self {
        let model = Arc::make_mut(&mut self.model);
        model.screens.retain(|s| s.pattern != screen.pattern);
        model.screens.push(screen);
        self
    }

    pub fn without_screen(mut self, pattern: &str) -> Self {
        Arc::make_mut(&mut self.model).screens.retain(|s| s.pattern != pattern);
        self
    }

    pub fn with_denial(mut self, denial: DenialBehavior) -> Self {
        Arc::make_mut(&mut self.model).denial = denial;
        self
    }

    pub fn screen(&self, pattern: &str) -> Option<&Screen> {
        self.model.screens.iter().find(|s| s.pattern == pattern)
    }

    pub fn open_page(&self) -> SimulatedPage {
        SimulatedPage { model: Arc::clone(&self.model), state: Mutex::new(PageState::default()) }
    }
}

impl Default for SimulatedApp {
    fn default() -> Self {
        Self::from_registry(&RouteRegistry::builtin())
    }
}

#[async_trait]
impl PageFactory for SimulatedApp {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>> {
        Ok(Box::new(self.open_page()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum View {
    #[default]
    Blank,
    Screen(usize),
    NotFound,
    Denied,
    ErrorBoundary,
}

#[derive(Debug, Default)]
struct PageState {
    router: MockRouter,
    storage: HashMap<String, String>,
    path: String,
    view: View,
    text: String,
    fields: HashMap<String, String>,
    dialogs: usize,
    toasts: usize,
    viewport: Viewport,
    errors: Vec<String>,
    network: Vec<NetworkEvent>,
}

impl PageState {
    fn token(&self) -> Option<String> {
        TOKEN_KEYS.iter().find_map(|key| self.storage.get(*key).cloned())
    }

    fn fetch(&mut self, method: Method, url: &str, body: Option<Value>) -> E2eResult<Dispatch> {
        let mut request = MockRequest::new(method, url)?;
        if let Some(token) = self.token() {
            request = request.with_bearer(&token);
        }
        if let Some(body) = body {
            request = request.with_json(body);
        }
        let dispatch = self.router.dispatch(&request);
        let outcome = match &dispatch {
            Dispatch::Fulfilled { rule, response } => {
                NetworkOutcome::Fulfilled { rule: rule.clone(), status: response.status.as_u16() }
            }
            Dispatch::Aborted { rule, reason } => NetworkOutcome::Aborted { rule: rule.clone(), reason: reason.clone() },
            Dispatch::Unmatched => NetworkOutcome::Unrouted,
        };
        self.network.push(NetworkEvent { method: request.method.to_string(), url: request.url.to_string(), outcome });
        Ok(dispatch)
    }
}

impl AppModel {
    fn find_screen(&self, path: &str) -> Option<usize> {
        // Literal patterns win over parameterized ones.
        self.screens
            .iter()
            .position(|s| s.pattern == path)
            .or_else(|| self.screens.iter().position(|s| s.matches(path)))
    }

    fn navigate(&self, state: &mut PageState, target: &str, depth: u8) -> E2eResult<()> {
        if depth > MAX_REDIRECTS {
            return Err(E2eError::Navigation { path: target.to_string(), reason: "too many redirects".to_string() });
        }
        let path = normalize_path(target)?;
        debug!("navigate {}", path);
        state.path = path.clone();
        state.dialogs = 0;
        state.fields.clear();

        let Some(index) = self.find_screen(&path) else {
            state.view = View::NotFound;
            state.text = NOT_FOUND_TEXT.to_string();
            return Ok(());
        };
        let screen = &self.screens[index];

        let mut viewer = None;
        if !screen.public {
            if state.token().is_none() {
                return self.navigate(state, LOGIN_PATH, depth + 1);
            }
            match state.fetch(Method::GET, "/api/auth/me", None)? {
                Dispatch::Fulfilled { response, .. } if response.is_success() => {
                    match serde_json::from_value::<Identity>(response.body["user"].clone()) {
                        Ok(identity) => viewer = Some(identity),
                        Err(_) => return self.navigate(state, LOGIN_PATH, depth + 1),
                    }
                }
                Dispatch::Fulfilled { .. } => return self.navigate(state, LOGIN_PATH, depth + 1),
                Dispatch::Aborted { reason, .. } => return Ok(self.crash(state, &format!("session check failed: {}", reason))),
                Dispatch::Unmatched => return Ok(self.crash(state, "Failed to fetch /api/auth/me")),
            }
        }

        if let Some(identity) = &viewer {
            if screen.denied_roles.contains(&identity.role) {
                return match &self.denial {
                    DenialBehavior::Render => {
                        state.view = View::Denied;
                        state.text = ACCESS_DENIED_TEXT.to_string();
                        Ok(())
                    }
                    DenialBehavior::Redirect(to) => {
                        let to = to.clone();
                        self.navigate(state, &to, depth + 1)
                    }
                };
            }
        }

        let mut records = 0usize;
        for call in &screen.api_calls {
            let url = match screen.param_value(&path) {
                Some(value) => call.replace("{id}", value),
                None => call.clone(),
            };
            match state.fetch(Method::GET, &url, None)? {
                Dispatch::Fulfilled { response, .. } if response.is_success() => records += record_count(&response.body),
                Dispatch::Fulfilled { response, .. } => {
                    return Ok(self.crash(state, &format!("Request failed with status code {}", response.status.as_u16())));
                }
                Dispatch::Aborted { reason, .. } => return Ok(self.crash(state, &format!("Failed to fetch {}: {}", url, reason))),
                Dispatch::Unmatched => return Ok(self.crash(state, &format!("Failed to fetch {}", url))),
            }
        }

        if screen.crashes {
            return Ok(self.crash(state, "TypeError: Cannot read properties of undefined (reading 'map')"));
        }

        state.view = View::Screen(index);
        state.text = render_text(screen, viewer.as_ref(), records, None);
        Ok(())
    }

    fn crash(&self, state: &mut PageState, error: &str) {
        state.errors.push(error.to_string());
        state.view = View::ErrorBoundary;
        state.text = ERROR_BOUNDARY_TEXT.to_string();
    }

    fn controls(&self, state: &PageState) -> Vec<SimControl> {
        let mut controls = match state.view {
            View::Screen(index) => self.screens[index].controls.clone(),
            View::NotFound | View::Denied | View::ErrorBoundary => vec![SimControl::link("Back to Dashboard", "/dashboard")],
            View::Blank => Vec::new(),
        };
        if state.dialogs > 0 {
            controls.push(SimControl::button(DIALOG_CLOSE, "Close", ControlEffect::CloseDialog));
        }
        controls
    }

    fn fields(&self, state: &PageState) -> &[String] {
        match state.view {
            View::Screen(index) => &self.screens[index].fields,
            _ => &[],
        }
    }

    fn click(&self, state: &mut PageState, selector: &str) -> E2eResult<()> {
        let control = self
            .controls(state)
            .into_iter()
            .find(|c| c.selector == selector)
            .ok_or_else(|| E2eError::ElementNotFound(selector.to_string()))?;
        if control.disabled {
            return Ok(());
        }
        match control.effect {
            ControlEffect::Navigate(to) => self.navigate(state, &to, 0)?,
            ControlEffect::OpenDialog => state.dialogs += 1,
            ControlEffect::CloseDialog => state.dialogs = state.dialogs.saturating_sub(1),
            ControlEffect::ShowToast => state.toasts += 1,
            ControlEffect::CallApi { method, path } => {
                let body = json!(state.fields.clone());
                state.fetch(method, &path, Some(body))?;
                state.toasts += 1;
            }
            ControlEffect::SubmitLogin => self.submit_login(state)?,
            ControlEffect::Nothing => {}
        }
        Ok(())
    }

    fn submit_login(&self, state: &mut PageState) -> E2eResult<()> {
        let body = json!({
            "email": state.fields.get(EMAIL_INPUT).cloned().unwrap_or_default(),
            "password": state.fields.get(PASSWORD_INPUT).cloned().unwrap_or_default(),
        });
        let failure = match state.fetch(Method::POST, "/api/auth/login", Some(body))? {
            Dispatch::Fulfilled { response, .. } if response.is_success() => {
                match serde_json::from_value::<LoginResponse>(response.body) {
                    Ok(login) => {
                        state.storage.insert(SESSION_TOKEN_KEY.to_string(), login.token);
                        state.storage.insert(SESSION_USER_KEY.to_string(), serde_json::to_string(&login.user)?);
                        return self.navigate(state, "/dashboard", 0);
                    }
                    Err(_) => "Unexpected response from server".to_string(),
                }
            }
            Dispatch::Fulfilled { response, .. } => {
                response.body["error"].as_str().unwrap_or("Unable to sign in").to_string()
            }
            Dispatch::Aborted { .. } | Dispatch::Unmatched => "Network error. Please try again.".to_string(),
        };
        if let View::Screen(index) = state.view {
            state.text = render_text(&self.screens[index], None, 0, Some(&failure));
        }
        Ok(())
    }
}

fn normalize_path(target: &str) -> E2eResult<String> {
    let path = if target.starts_with("http://") || target.starts_with("https://") {
        url::Url::parse(target)
            .map_err(|e| E2eError::Navigation { path: target.to_string(), reason: e.to_string() })?
            .path()
            .to_string()
    } else {
        target.split(['?', '#']).next().unwrap_or_default().to_string()
    };
    Ok(if path.starts_with('/') { path } else { format!("/{}", path) })
}

fn record_count(body: &Value) -> usize {
    match body {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.get("data").and_then(Value::as_array).map_or(1, Vec::len),
        _ => 0,
    }
}

fn render_text(screen: &Screen, viewer: Option<&Identity>, records: usize, notice: Option<&str>) -> String {
    let mut lines = vec![format!("{} | {}", APP_NAME, screen.title)];
    if let Some(identity) = viewer {
        lines.push(format!("Signed in as {} ({})", identity.full_name(), identity.role.title()));
    }
    lines.push(screen.body.clone());
    if !screen.api_calls.is_empty() {
        lines.push(format!("Showing {} records", records));
    }
    for control in &screen.controls {
        lines.push(control.label.clone());
    }
    if let Some(notice) = notice {
        lines.push(notice.to_string());
    }
    lines.join("\n")
}

pub struct SimulatedPage {
    model: Arc<AppModel>,
    state: Mutex<PageState>,
}

impl SimulatedPage {
    /// PNG of the current view. Layout only; data values never change pixels.
    fn render_png(&self, state: &PageState) -> E2eResult<Vec<u8>> {
        let width = (state.viewport.width / 8).max(1);
        let height = (state.viewport.height / 8).max(1);
        let label = match state.view {
            View::Screen(index) => {
                let screen = &self.model.screens[index];
                format!("screen:{}:{}", screen.pattern, screen.title)
            }
            other => format!("{:?}", other),
        };
        let digest = Sha256::digest(label.as_bytes());
        let header = Rgba([digest[0], digest[1], digest[2], 255]);
        let stripe = Rgba([digest[3], digest[4], digest[5], 255]);
        let background = Rgba([250, 250, 252, 255]);

        let header_height = (height / 8).max(1);
        let mut img = RgbaImage::from_pixel(width, height, background);
        for y in 0..height {
            for x in 0..width {
                if y < header_height {
                    img.put_pixel(x, y, header);
                } else if (y - header_height) % 6 < 2 && x > width / 10 && x < width - width / 10 {
                    img.put_pixel(x, y, stripe);
                }
            }
        }
        if state.dialogs > 0 {
            let (x0, y0) = (width / 4, height / 4);
            for y in y0..height - y0 {
                for x in x0..width - x0 {
                    img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
                }
            }
        }

        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(bytes)
    }
}

#[async_trait]
impl Page for SimulatedPage {
    async fn goto(&self, path: &str) -> E2eResult<()> {
        let mut state = self.state.lock();
        self.model.navigate(&mut state, path, 0)
    }

    async fn current_path(&self) -> E2eResult<String> {
        Ok(self.state.lock().path.clone())
    }

    async fn route(&self, rule: MockRule) -> E2eResult<()> {
        self.state.lock().router.register(rule);
        Ok(())
    }

    async fn route_fallback(&self, rule: MockRule) -> E2eResult<()> {
        self.state.lock().router.set_fallback(rule);
        Ok(())
    }

    async fn set_storage_item(&self, key: &str, value: &str) -> E2eResult<()> {
        self.state.lock().storage.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn storage_item(&self, key: &str) -> E2eResult<Option<String>> {
        Ok(self.state.lock().storage.get(key).cloned())
    }

    async fn text_content(&self) -> E2eResult<String> {
        Ok(self.state.lock().text.clone())
    }

    async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        let state = self.state.lock();
        Ok(self.model.fields(&state).iter().any(|f| f == selector)
            || self.model.controls(&state).iter().any(|c| c.selector == selector))
    }

    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()> {
        let mut state = self.state.lock();
        if !self.model.fields(&state).iter().any(|f| f == selector) {
            return Err(E2eError::ElementNotFound(selector.to_string()));
        }
        state.fields.insert(selector.to_string(), value.to_string());
        Ok(())
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        let mut state = self.state.lock();
        self.model.click(&mut state, selector)
    }

    async fn press(&self, key: &str) -> E2eResult<()> {
        let mut state = self.state.lock();
        match key {
            "Escape" => state.dialogs = 0,
            "Enter" if self.model.controls(&state).iter().any(|c| c.selector == SUBMIT_BUTTON) => {
                self.model.click(&mut state, SUBMIT_BUTTON)?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn controls(&self) -> E2eResult<Vec<Control>> {
        let state = self.state.lock();
        Ok(self.model.controls(&state).iter().map(SimControl::to_control).collect())
    }

    async fn dialog_count(&self) -> E2eResult<usize> {
        Ok(self.state.lock().dialogs)
    }

    async fn toast_count(&self) -> E2eResult<usize> {
        Ok(self.state.lock().toasts)
    }

    async fn set_viewport(&self, viewport: Viewport) -> E2eResult<()> {
        self.state.lock().viewport = viewport;
        Ok(())
    }

    async fn layout_metrics(&self) -> E2eResult<LayoutMetrics> {
        let state = self.state.lock();
        let content = match state.view {
            View::Screen(index) => self.model.screens[index].min_content_width,
            _ => 0,
        };
        Ok(LayoutMetrics {
            viewport_width: state.viewport.width,
            scroll_width: state.viewport.width.max(content),
        })
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        let state = self.state.lock();
        self.render_png(&state)
    }

    async fn accessibility_scan(&self) -> E2eResult<Vec<A11yViolation>> {
        let state = self.state.lock();
        Ok(match state.view {
            View::Screen(index) => self.model.screens[index].violations.clone(),
            _ => Vec::new(),
        })
    }

    async fn page_errors(&self) -> E2eResult<Vec<String>> {
        Ok(self.state.lock().errors.clone())
    }

    async fn network_log(&self) -> E2eResult<Vec<NetworkEvent>> {
        Ok(self.state.lock().network.clone())
    }
}

fn testid(id: &str) -> String {
    format!(r#"[data-testid="{}"]"#, id)
}

/// The default screen for a registry route.
fn screen_for(route: &RouteDescriptor, registry: &RouteRegistry) -> Screen {
    if route.path == LOGIN_PATH {
        return Screen::new(LOGIN_PATH, "Sign In")
            .public()
            .with_body("Sign in to your Serenity Care account.\nEmail\nPassword")
            .with_field(EMAIL_INPUT)
            .with_field(PASSWORD_INPUT)
            .with_control(SimControl::button(SUBMIT_BUTTON, "Sign in", ControlEffect::SubmitLogin))
            .with_control(SimControl::link("Forgot password?", "/forgot-password"))
            .with_control(SimControl::link("Home", "/"));
    }

    let mut screen = Screen::new(&route.path, &route.name).deny(&route.denied_roles.iter().copied().collect::<Vec<_>>());
    for call in api_calls_for(&route.path) {
        screen = screen.with_api_call(call);
    }

    if route.public {
        screen = screen
            .public()
            .with_body(&format!("Welcome to Serenity Care Partners. {}.", route.name))
            .with_control(SimControl::link("Home", "/"))
            .with_control(SimControl::link("Sign in", LOGIN_PATH))
            .with_control(SimControl::link("Careers", "/careers"));
    } else {
        screen = screen
            .with_control(SimControl::link("Dashboard", "/dashboard"))
            .with_control(SimControl::link("Messages", "/messages"))
            .with_control(SimControl::link("Profile", "/settings/profile"))
            .with_control(SimControl::button(&testid("help"), "Help", ControlEffect::Nothing))
            .with_control(SimControl::button(&testid("logout"), "Logout", ControlEffect::Navigate(LOGIN_PATH.to_string())));
    }

    if route.has_params {
        if let Some(parent) = route.path.rsplit_once('/').map(|(parent, _)| parent) {
            if registry.get(parent).is_some() {
                screen = screen.with_control(SimControl::link("Back", parent));
            }
        }
    } else if !route.public && !screen.api_calls.is_empty() {
        let slug = route.slug();
        let export = screen.api_calls[0].clone();
        screen = screen
            .with_control(SimControl::button(&testid(&format!("new-{}", slug)), "New", ControlEffect::OpenDialog))
            .with_control(SimControl::button(
                &testid(&format!("export-{}", slug)),
                "Export",
                ControlEffect::CallApi { method: Method::GET, path: export },
            ));
    }

    if route.has_form {
        let submit_path = if route.path == "/forgot-password" {
            "/api/auth/forgot-password".to_string()
        } else {
            format!("/api/console/forms{}", route.path)
        };
        screen = screen
            .with_field(r#"input[name="name"]"#)
            .with_field(r#"textarea[name="notes"]"#)
            .with_control(SimControl::button(
                SUBMIT_BUTTON,
                "Submit",
                ControlEffect::CallApi { method: Method::POST, path: submit_path },
            ));
    }
    screen
}

/// Requests each console screen issues on load.
fn api_calls_for(path: &str) -> Vec<&'static str> {
    match path {
        "/careers" => vec!["/api/public/jobs"],
        "/dashboard" => vec!["/api/console/dashboard/summary"],
        "/dashboard/executive" => vec!["/api/console/admin/stats", "/api/console/billing/summary"],
        "/dashboard/finance" => vec!["/api/console/billing/summary"],
        "/dashboard/clinical" => vec!["/api/console/patients?status=active"],
        "/dashboard/hr" => vec!["/api/console/hr/onboarding"],
        "/dashboard/compliance" => vec!["/api/console/credentials/summary"],
        "/dashboard/operations" => vec!["/api/console/scheduling/open-shifts", "/api/console/evv/exceptions"],
        "/dashboard/caregiver" => vec!["/api/console/evv/visits?status=scheduled"],
        "/patients" => vec!["/api/console/patients"],
        "/patients/:id" => vec!["/api/console/patients/{id}"],
        "/caregivers" => vec!["/api/console/hr/employees"],
        "/caregivers/:id" => vec!["/api/console/credentials/caregiver/{id}"],
        "/scheduling" => vec!["/api/console/scheduling/shifts"],
        "/scheduling/open-shifts" => vec!["/api/console/scheduling/open-shifts"],
        "/scheduling/my-schedule" => vec!["/api/console/scheduling/shifts?status=assigned"],
        "/evv" => vec!["/api/console/evv/visits"],
        "/evv/exceptions" => vec!["/api/console/evv/exceptions"],
        "/evv/clock" => vec!["/api/console/evv/visits?status=scheduled"],
        "/billing" => vec!["/api/console/billing/summary", "/api/console/billing/claims?limit=10"],
        "/billing/claims" => vec!["/api/console/billing/claims"],
        "/billing/claims/:id" => vec!["/api/console/billing/claims/{id}"],
        "/billing/denials" => vec!["/api/console/billing/claims?status=denied"],
        "/payroll" => vec!["/api/console/payroll/runs"],
        "/hr/applicants" => vec!["/api/console/hr/applicants"],
        "/hr/applicants/:id" => vec!["/api/console/hr/applicants/{id}"],
        "/hr/onboarding" => vec!["/api/console/hr/onboarding"],
        "/hr/employees" => vec!["/api/console/hr/employees"],
        "/credentials" => vec!["/api/console/credentials", "/api/console/credentials/summary"],
        "/credentials/expiring" => vec!["/api/console/credentials/expiring?days=30"],
        "/compliance/audits" => vec!["/api/console/compliance/audits"],
        "/compliance/incidents" => vec!["/api/console/compliance/incidents"],
        "/training" => vec!["/api/console/training/courses"],
        "/messages" => vec!["/api/console/messages"],
        "/reports" => vec!["/api/console/reports"],
        "/admin/users" => vec!["/api/console/admin/users"],
        "/admin/users/:id" => vec!["/api/console/admin/users/{id}"],
        "/admin/roles" => vec!["/api/console/admin/roles"],
        "/admin/audit-logs" => vec!["/api/console/admin/audit-logs?page=1&limit=25"],
        "/admin/settings" => vec!["/api/console/admin/settings"],
        "/admin/integrations" => vec!["/api/console/admin/integrations"],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::mock_all_endpoints;
    use crate::session::SessionState;

    async fn signed_in(app: &SimulatedApp, role: &str) -> SimulatedPage {
        let page = app.open_page();
        mock_all_endpoints(&page).await.unwrap();
        for (key, value) in SessionState::for_role(role).storage_entries().unwrap() {
            page.set_storage_item(&key, &value).await.unwrap();
        }
        page
    }

    #[tokio::test]
    async fn test_protected_route_without_session_redirects_to_login() {
        let page = SimulatedApp::default().open_page();
        mock_all_endpoints(&page).await.unwrap();
        page.goto("/patients").await.unwrap();
        assert_eq!(page.current_path().await.unwrap(), LOGIN_PATH);
        assert!(page.is_visible(PASSWORD_INPUT).await.unwrap());
    }

    #[tokio::test]
    async fn test_renders_with_data() {
        let page = signed_in(&SimulatedApp::default(), "founder").await;
        page.goto("/patients").await.unwrap();
        let text = page.text_content().await.unwrap();
        assert!(text.contains("Patients"));
        assert!(text.contains("Signed in as"));
        assert!(page.page_errors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_role_guard_renders_denial() {
        let page = signed_in(&SimulatedApp::default(), "caregiver").await;
        page.goto("/admin/users").await.unwrap();
        assert!(page.text_content().await.unwrap().contains("Access Denied"));
        assert!(page.controls().await.unwrap().iter().all(|c| c.label != "New"));
    }

    #[tokio::test]
    async fn test_role_guard_redirect() {
        let app = SimulatedApp::default().with_denial(DenialBehavior::Redirect("/dashboard".to_string()));
        let page = signed_in(&app, "caregiver").await;
        page.goto("/admin/users").await.unwrap();
        assert_eq!(page.current_path().await.unwrap(), "/dashboard");
    }

    #[tokio::test]
    async fn test_missing_mocks_render_error_boundary() {
        let page = SimulatedApp::default().open_page();
        for (key, value) in SessionState::for_role("founder").storage_entries().unwrap() {
            page.set_storage_item(&key, &value).await.unwrap();
        }
        page.goto("/patients").await.unwrap();
        assert!(page.text_content().await.unwrap().contains("Something went wrong"));
        assert_eq!(page.page_errors().await.unwrap().len(), 1);
        assert!(page
            .network_log()
            .await
            .unwrap()
            .iter()
            .all(|e| e.outcome == NetworkOutcome::Unrouted));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let page = signed_in(&SimulatedApp::default(), "founder").await;
        page.goto("/does-not-exist").await.unwrap();
        assert!(page.text_content().await.unwrap().contains("Page Not Found"));
    }

    #[tokio::test]
    async fn test_login_form() {
        let page = SimulatedApp::default().open_page();
        mock_all_endpoints(&page).await.unwrap();
        page.goto(LOGIN_PATH).await.unwrap();
        page.fill(EMAIL_INPUT, "founder@test.serenitycare.com").await.unwrap();
        page.fill(PASSWORD_INPUT, "wrong").await.unwrap();
        page.click(SUBMIT_BUTTON).await.unwrap();
        assert_eq!(page.current_path().await.unwrap(), LOGIN_PATH);
        assert!(page.text_content().await.unwrap().contains("Invalid credentials"));

        page.fill(PASSWORD_INPUT, serenity_common::TEST_PASSWORD).await.unwrap();
        page.click(SUBMIT_BUTTON).await.unwrap();
        assert_eq!(page.current_path().await.unwrap(), "/dashboard");
        assert!(page.storage_item("serenity_access_token").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dialog_and_escape() {
        let page = signed_in(&SimulatedApp::default(), "founder").await;
        page.goto("/patients").await.unwrap();
        page.click(r#"[data-testid="new-patients"]"#).await.unwrap();
        assert_eq!(page.dialog_count().await.unwrap(), 1);
        page.press("Escape").await.unwrap();
        assert_eq!(page.dialog_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_screenshot_is_stable_across_data() {
        let page = signed_in(&SimulatedApp::default(), "founder").await;
        page.goto("/patients").await.unwrap();
        let first = page.screenshot().await.unwrap();
        page.goto("/patients").await.unwrap();
        assert_eq!(first, page.screenshot().await.unwrap());
        page.goto("/billing").await.unwrap();
        assert_ne!(first, page.screenshot().await.unwrap());
    }

    #[test]
    fn test_param_substitution() {
        let screen = Screen::new("/patients/:id", "Patient");
        assert_eq!(screen.param_value("/patients/pat-001"), Some("pat-001"));
        assert!(screen.matches("/patients/pat-001"));
        assert!(!screen.matches("/patients"));
    }
}
