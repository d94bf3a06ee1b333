//! HTTP server: routing, middleware, binding, graceful shutdown.

use crate::handlers;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use marionette::{PlatformHandle, TargetApp};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{debug, error, info};

/// Request bodies are small control messages; `/type` alone carries payload
/// text and gets a wider cap.
const BODY_LIMIT: usize = 10 * 1024;
const TYPE_BODY_LIMIT: usize = 100 * 1024;

/// Delay between `stop` and `start` on restart, giving the OS time to
/// release the listener.
const RESTART_DELAY: Duration = Duration::from_millis(200);

#[derive(Clone)]
pub struct AppState {
    pub platform: PlatformHandle,
    /// The application this server instance is scoped to. Read-only after
    /// server start.
    pub target: Option<TargetApp>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(platform: PlatformHandle, target: Option<TargetApp>) -> Self {
        Self {
            platform,
            target,
            shutdown: CancellationToken::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::status::api_descriptor))
        .route("/health", get(handlers::status::health))
        .route("/status", get(handlers::status::status))
        .route("/apps", get(handlers::status::apps))
        .route("/windows", get(handlers::status::windows))
        .route("/quit", post(handlers::status::quit))
        .route("/screenshot", get(handlers::screenshot::screenshot))
        .route("/click", post(handlers::input::click))
        .route("/click/element", post(handlers::input::click_element))
        .route("/scroll", post(handlers::input::scroll))
        .route(
            "/type",
            post(handlers::typing::type_text).layer(DefaultBodyLimit::max(TYPE_BODY_LIMIT)),
        )
        .route("/key", post(handlers::typing::key))
        .route("/wait", post(handlers::wait::wait))
        .route("/accessibility/tree", get(handlers::tree::tree))
        .route("/accessibility/element", get(handlers::tree::element))
        .route("/accessibility/elements", get(handlers::tree::elements))
        .route("/accessibility/focused", get(handlers::tree::focused))
        .route("/accessibility/action", post(handlers::tree::action))
        .route("/menu", get(handlers::menu::menu_tree).post(handlers::menu::trigger_menu))
        .layer(middleware::from_fn(request_log))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// Error-trap middleware: anything a handler managed to panic on becomes
/// the generic 500 body, with the details kept server-side.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("handler panicked: {detail}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error", "code": 500 })),
    )
        .into_response()
}

async fn request_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(req).await;
    debug!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response
}

/// Server lifecycle: `Idle → Starting → Running → Stopping → Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Owns the listener task and tracks the lifecycle phase.
pub struct Server {
    state: AppState,
    phase: Arc<Mutex<ServerPhase>>,
    local_addr: Option<SocketAddr>,
    task: Option<JoinHandle<()>>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            phase: Arc::new(Mutex::new(ServerPhase::Idle)),
            local_addr: None,
            task: None,
        }
    }

    pub fn phase(&self) -> ServerPhase {
        *self.phase.lock().unwrap()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Bind and start serving. Port 0 picks a free ephemeral port; the
    /// chosen one is read back from the listener.
    pub async fn start(&mut self, host: &str, port: u16) -> anyhow::Result<SocketAddr> {
        self.set_phase(ServerPhase::Starting);
        let listener = match TcpListener::bind((host, port)).await {
            Ok(listener) => listener,
            Err(e) => {
                self.set_phase(ServerPhase::Stopped);
                return Err(anyhow::anyhow!("Failed to bind {host}:{port}: {e}"));
            }
        };
        let addr = listener.local_addr()?;
        self.local_addr = Some(addr);

        let router = build_router(self.state.clone());
        let shutdown = self.state.shutdown.clone();
        let phase = self.phase.clone();
        let task = tokio::spawn(async move {
            let wait_shutdown = shutdown.clone();
            let shutdown_phase = phase.clone();
            let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                wait_shutdown.cancelled().await;
                *shutdown_phase.lock().unwrap() = ServerPhase::Stopping;
            });
            if let Err(e) = serve.await {
                error!("server error: {e}");
            }
            *phase.lock().unwrap() = ServerPhase::Stopped;
        });
        self.task = Some(task);
        self.set_phase(ServerPhase::Running);
        info!("listening on http://{addr}");
        Ok(addr)
    }

    pub async fn stop(&mut self) {
        if self.phase() != ServerPhase::Running {
            return;
        }
        self.set_phase(ServerPhase::Stopping);
        self.state.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.set_phase(ServerPhase::Stopped);
    }

    pub async fn restart(&mut self, host: &str, port: u16) -> anyhow::Result<SocketAddr> {
        self.stop().await;
        tokio::time::sleep(RESTART_DELAY).await;
        // A cancelled token stays cancelled; the restarted server needs a
        // fresh one.
        self.state.shutdown = CancellationToken::new();
        self.start(host, port).await
    }

    /// Block until the serve task finishes (shutdown token, `/quit`, or
    /// watchdog).
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.set_phase(ServerPhase::Stopped);
    }

    fn set_phase(&self, phase: ServerPhase) {
        *self.phase.lock().unwrap() = phase;
    }
}
