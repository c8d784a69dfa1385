// Shared fixtures for the integration tests.
#![allow(dead_code)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use codeditor_core::dispatcher::{Collaborators, CommandDispatcher, Event, LogoutPolicy};
use codeditor_core::executors::remote::HttpCodeExecutor;
use codeditor_core::executors::{
    ExecutionChannel, ExecutionRequest, ExecutionResult, ExecutorRouter,
};
use codeditor_core::navigation::RecordingNavigator;
use codeditor_core::persistence::{DocumentStore, SaveRequest, SaveResponse};
use codeditor_core::registry::LanguageId;
use codeditor_core::session::StaticSessions;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[derive(Clone, Default)]
struct MockBackendState {
    executions: Arc<Mutex<Vec<ExecutionRequest>>>,
    saves: Arc<Mutex<Vec<SaveRequest>>>,
}

/// Pretends to run code:
/// - `print('x')` prints `x`
/// - `sleep:<ms>` then `print(...)` on the next line waits first
/// - `hang` never answers
/// - `exit:<n>` exits with status n
/// - markup languages are rejected with 422
async fn execute_handler(
    State(state): State<MockBackendState>,
    Json(request): Json<ExecutionRequest>,
) -> Result<Json<ExecutionResult>, (StatusCode, Json<serde_json::Value>)> {
    state.executions.lock().unwrap().push(request.clone());

    if matches!(
        request.language,
        LanguageId::Html | LanguageId::Css | LanguageId::Json
    ) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "unsupported_language", "details": request.language})),
        ));
    }

    let mut stdout = String::new();
    let mut exit_status = 0;
    for line in request.content.lines() {
        if line == "hang" {
            std::future::pending::<()>().await;
        } else if let Some(ms) = line.strip_prefix("sleep:") {
            tokio::time::sleep(Duration::from_millis(ms.parse().unwrap_or(0))).await;
        } else if let Some(code) = line.strip_prefix("exit:") {
            exit_status = code.parse().unwrap_or(1);
        } else if let Some(text) = line
            .strip_prefix("print('")
            .and_then(|rest| rest.strip_suffix("')"))
        {
            stdout.push_str(text);
            stdout.push('\n');
        }
    }

    Ok(Json(ExecutionResult {
        stdout,
        stderr: String::new(),
        exit_status,
        duration_ms: 1,
    }))
}

async fn documents_handler(
    State(state): State<MockBackendState>,
    Json(request): Json<SaveRequest>,
) -> Json<SaveResponse> {
    let rejected = request.content.contains("reject");
    state.saves.lock().unwrap().push(request);
    if rejected {
        Json(SaveResponse::failed("quota exceeded"))
    } else {
        Json(SaveResponse::ok())
    }
}

pub struct MockBackendServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    state: MockBackendState,
}

impl MockBackendServer {
    pub async fn start() -> Self {
        let state = MockBackendState::default();
        let app = Router::new()
            .route("/health", get(|| async { Json(json!({"status": "healthy"})) }))
            .route("/execute", post(execute_handler))
            .route("/documents", post(documents_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        MockBackendServer {
            addr,
            shutdown_tx,
            state,
        }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn executions(&self) -> Vec<ExecutionRequest> {
        self.state.executions.lock().unwrap().clone()
    }

    pub fn saves(&self) -> Vec<SaveRequest> {
        self.state.saves.lock().unwrap().clone()
    }

    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

pub struct Harness {
    pub dispatcher: CommandDispatcher,
    pub events: mpsc::UnboundedReceiver<Event>,
    pub sessions: StaticSessions,
    pub navigator: RecordingNavigator,
}

impl Harness {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn DocumentStore>,
        policy: LogoutPolicy,
    ) -> Self {
        let router =
            ExecutorRouter::with_default_backend(Arc::new(HttpCodeExecutor::new(base_url)));
        let sessions = StaticSessions::signed_in("grace");
        let navigator = RecordingNavigator::default();
        let collaborators = Collaborators {
            channel: ExecutionChannel::new(router, timeout),
            store,
            sessions: Arc::new(sessions.clone()),
            navigator: Arc::new(navigator.clone()),
        };
        let (dispatcher, events) = CommandDispatcher::new(collaborators, policy);
        Harness {
            dispatcher,
            events,
            sessions,
            navigator,
        }
    }

    pub async fn next_event(&mut self) -> Event {
        tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("no event within 5s")
            .expect("event channel closed")
    }
}
