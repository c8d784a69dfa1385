//! HTTP backend for the CodeDitor editor page
//!
//! Exposes the execution channel and a document store over the editor's wire
//! shapes:
//!
//! - `POST /execute`: `{content, language}` → `{stdout, stderr, exitStatus, durationMs}`
//! - `POST /documents`: `{content, language, sessionId}` → `{ok}` or `{ok: false, error}`
//! - `GET /health`
//!
//! A run that fails inside the server (timeout, missing toolchain) still answers
//! 200 with a synthetic non-zero result, so the console always has something to
//! show. Only a language with no backend is rejected, with 422.

pub mod error;

pub use error::{Result, ServerError};

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Json as AxumJson, State};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{Json, Response};
use axum::routing::{get, post};
use axum::{middleware, Router};
use codeditor_core::executors::{ExecutionChannel, ExecutionRequest, ExecutionResult};
use codeditor_core::persistence::{DocumentStore, SaveRequest, SaveResponse};
use codeditor_core::{EditorError, ExecutorError, Registry};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub languages: Vec<String>,
}

/// Request bodies above this are rejected before reaching a handler.
pub const MAX_BODY_BYTES: usize = 1 << 20;

/// Which browser origins may call the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsPolicy {
    Disabled,
    #[default]
    AnyOrigin,
    Origins(Vec<String>),
}

impl CorsPolicy {
    fn layer(&self) -> Option<CorsLayer> {
        match self {
            CorsPolicy::Disabled => None,
            CorsPolicy::AnyOrigin => Some(CorsLayer::permissive()),
            CorsPolicy::Origins(origins) => {
                let parsed: Vec<HeaderValue> =
                    origins.iter().filter_map(|o| o.parse().ok()).collect();
                if parsed.len() != origins.len() {
                    log::warn!("Ignoring unparseable CORS origins in {:?}", origins);
                }
                Some(
                    CorsLayer::new()
                        .allow_origin(parsed)
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers(Any),
                )
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub cors: CorsPolicy,
    pub max_body_size: usize,
    /// One log line per request, `/health` at debug level.
    pub log_requests: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cors: CorsPolicy::default(),
            max_body_size: MAX_BODY_BYTES,
            log_requests: true,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bind_addr(mut self, addr: &str) -> Result<Self> {
        self.bind_addr = addr.parse().map_err(|e| {
            ServerError::config_error(format!("'{}' is not a socket address: {}", addr, e))
        })?;
        Ok(self)
    }

    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = cors;
        self
    }
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let id = uuid::Uuid::new_v4();
    let (method, path) = (request.method().clone(), request.uri().path().to_string());
    let started = Instant::now();
    let response = next.run(request).await;

    let level = if path == "/health" {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    log::log!(
        level,
        "{} {} {} -> {} ({} ms)",
        id,
        method,
        path,
        response.status(),
        started.elapsed().as_millis()
    );
    response
}

#[derive(Clone)]
struct AppState {
    channel: ExecutionChannel,
    store: Arc<dyn DocumentStore>,
}

async fn execute_handler(
    State(state): State<AppState>,
    AxumJson(request): AxumJson<ExecutionRequest>,
) -> Result<Json<ExecutionResult>> {
    log::info!(
        "Received {} execution request ({} bytes)",
        request.language,
        request.content.len()
    );

    let started = Instant::now();
    match state.channel.execute(&request).await {
        Ok(result) => Ok(Json(result)),
        Err(err @ ExecutorError::UnsupportedLanguage(_)) => Err(ServerError::from(err)),
        Err(err) => {
            let err = EditorError::from(err);
            log::warn!("Execution failed: {}", err);
            Ok(Json(ExecutionResult::from_failure(
                &err,
                started.elapsed().as_millis() as u64,
            )))
        }
    }
}

async fn documents_handler(
    State(state): State<AppState>,
    AxumJson(request): AxumJson<SaveRequest>,
) -> (StatusCode, Json<SaveResponse>) {
    let outcome = if request.session_id.trim().is_empty() {
        Err(ServerError::invalid_request("sessionId is required"))
    } else {
        state
            .store
            .save(&request)
            .await
            .map_err(ServerError::Persistence)
    };

    match outcome {
        Ok(()) => (StatusCode::OK, Json(SaveResponse::ok())),
        Err(err) => {
            log::error!("Document for session '{}' not saved: {}", request.session_id, err);
            let status =
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(SaveResponse::failed(&err.to_string())))
        }
    }
}

/// The CodeDitor backend server.
pub struct BackendServer {
    channel: ExecutionChannel,
    store: Arc<dyn DocumentStore>,
    config: ServerConfig,
}

impl BackendServer {
    pub fn new(channel: ExecutionChannel, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            channel,
            store,
            config: ServerConfig::default(),
        }
    }

    pub fn with_config(
        channel: ExecutionChannel,
        store: Arc<dyn DocumentStore>,
        config: ServerConfig,
    ) -> Self {
        Self {
            channel,
            store,
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Routes plus body limit, request logging, tracing and CORS.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            channel: self.channel.clone(),
            store: self.store.clone(),
        };
        let languages: Vec<String> = self
            .channel
            .router()
            .supported()
            .iter()
            .map(|id| id.to_string())
            .collect();
        let health = move || async move {
            Json(HealthResponse {
                status: "healthy".to_string(),
                timestamp: chrono::Utc::now(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                languages,
            })
        };

        let mut router = Router::new()
            .route("/health", get(health))
            .route("/execute", post(execute_handler))
            .route("/documents", post(documents_handler))
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .with_state(state);

        if self.config.log_requests {
            router = router.layer(middleware::from_fn(log_request));
        }
        router = router.layer(TraceLayer::new_for_http());
        match self.config.cors.layer() {
            Some(cors) => router.layer(cors),
            None => router,
        }
    }

    /// Binds `config.bind_addr` and serves until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_addr;
        let app = self.build_router();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::config_error(format!("Cannot listen on {}: {}", addr, e)))?;

        let runnable: Vec<&str> = Registry::languages()
            .iter()
            .filter(|entry| self.channel.router().supports(entry.id))
            .map(|entry| entry.label)
            .collect();
        log::info!(
            "CodeDitor backend listening on http://{} ('{}' store; runs {})",
            addr,
            self.store.name(),
            runnable.join(", ")
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::internal(format!("Backend stopped with an error: {}", e)))?;

        log::info!("CodeDitor backend stopped");
        Ok(())
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix. A handler that cannot be installed never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("Ctrl+C received, stopping backend"),
            Err(e) => {
                log::error!("Cannot listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                log::info!("SIGTERM received, stopping backend");
            }
            Err(e) => {
                log::error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
