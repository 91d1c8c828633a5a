//! Mock API server - the mocked backend served over loopback HTTP
//!
//! For browsers that cannot intercept in-process, the whole rule set is
//! exposed on a local port. Dispatch is identical to page interception:
//! a fulfilled rule becomes the HTTP response, an aborted handler becomes a
//! 502, and a request no rule takes is a 404.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::mock::{router_with_all_endpoints, Dispatch, MockRequest, MockRouter};

pub const HEALTH_PATH: &str = "/__health";

/// Handle to a running mock API server
pub struct MockApiServer {
    addr: SocketAddr,
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MockApiServer {
    /// Serve every endpoint rule plus the catch-all
    pub async fn spawn(config: ServerConfig) -> E2eResult<Self> {
        Self::with_router(config, router_with_all_endpoints()?).await
    }

    /// Serve a specific rule set
    pub async fn with_router(config: ServerConfig, router: MockRouter) -> E2eResult<Self> {
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|e| E2eError::ServerStartup(format!("Failed to bind {}:{}: {}", config.host, config.port, e)))?;
        let addr = listener.local_addr()?;
        let base_url = format!("http://{}", addr);

        info!("Starting mock API server on {} ({} rules)", addr, router.len());

        let app = Router::new()
            .route(HEALTH_PATH, get(health))
            .fallback(dispatch)
            .with_state(Arc::new(router))
            .layer(TraceLayer::new_for_http());

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = signal.await;
            });
            if let Err(e) = serve.await {
                error!("Mock API server error: {}", e);
            }
        });

        let server = Self { addr, base_url, shutdown: Some(shutdown), task: Some(task) };
        server.wait_for_healthy(config.startup_timeout).await?;

        info!("Mock API server is healthy at {}", server.base_url);
        Ok(server)
    }

    /// Probe the health route until it answers 2xx or `deadline` passes
    async fn wait_for_healthy(&self, deadline: Duration) -> E2eResult<()> {
        let probe_url = format!("{}{}", self.base_url, HEALTH_PATH);
        let client = reqwest::Client::builder().timeout(Duration::from_secs(2)).build()?;
        let give_up = Instant::now() + deadline;

        let mut probes = 0;
        while Instant::now() < give_up {
            probes += 1;
            match client.get(&probe_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => warn!("{} answered {}", probe_url, resp.status()),
                Err(e) if e.is_connect() => debug!("{} not accepting yet", probe_url),
                Err(e) => warn!("Probe of {} failed: {}", probe_url, e),
            }
            sleep(Duration::from_millis(50)).await;
        }

        Err(E2eError::ServerHealthCheck(probes))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop the server and wait for it to drain
    pub async fn stop(mut self) -> E2eResult<()> {
        info!("Stopping mock API server at {}", self.base_url);
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.map_err(|e| E2eError::ServerStartup(format!("server task failed: {}", e)))?;
        }
        Ok(())
    }
}

impl Drop for MockApiServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Configuration for the mock API server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,

    /// Port to listen on (0 = any free port)
    pub port: u16,

    /// Timeout for server startup
    pub startup_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            startup_timeout: Duration::from_secs(10),
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn dispatch(
    State(router): State<Arc<MockRouter>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut request = match MockRequest::new(method, &uri.to_string()) {
        Ok(request) => request,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e.to_string()),
    };
    for (name, value) in &headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    request = request.with_body_text(&String::from_utf8_lossy(&body));

    match router.dispatch(&request) {
        Dispatch::Fulfilled { rule, response } => {
            debug!("{} {} -> {} ({})", request.method, request.path(), response.status, rule);
            (response.status, [(header::CONTENT_TYPE, response.content_type.clone())], response.body_text()).into_response()
        }
        Dispatch::Aborted { rule, reason } => {
            failure(StatusCode::BAD_GATEWAY, format!("Mock handler '{}' failed: {}", rule, reason))
        }
        Dispatch::Unmatched => {
            failure(StatusCode::NOT_FOUND, format!("No mock for {} {}", request.method, request.path()))
        }
    }
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}
