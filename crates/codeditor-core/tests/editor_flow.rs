mod common;

use codeditor_core::dispatcher::{Command, CommandOutcome, Event, LogoutPolicy};
use codeditor_core::editor::{EditorSurface, NoticeLevel};
use codeditor_core::errors::EditorError;
use codeditor_core::errors::ExecutorError;
use codeditor_core::executors::remote::HttpCodeExecutor;
use codeditor_core::executors::{CodeExecutor, ExecutionRequest, EXIT_TIMEOUT, EXIT_UNSUPPORTED};
use codeditor_core::navigation::ENTRY_PATH;
use codeditor_core::persistence::{MemoryDocumentStore, RemoteDocumentStore};
use codeditor_core::registry::LanguageId;
use codeditor_core::session::SessionProvider;
use common::{Harness, MockBackendServer};
use std::sync::Arc;
use std::time::Duration;

fn harness(server: &MockBackendServer, timeout: Duration) -> Harness {
    let store = Arc::new(RemoteDocumentStore::new(&server.address()));
    Harness::new(&server.address(), timeout, store, LogoutPolicy::Confirm)
}

#[tokio::test]
async fn test_python_print_scenario() {
    let server = MockBackendServer::start().await;
    let mut h = harness(&server, Duration::from_secs(5));
    let mut surface = EditorSurface::default();

    surface.set_language("python").unwrap();
    surface.set_content("print('hi')");
    let outcome = h.dispatcher.dispatch(&mut surface, Command::Run).unwrap();
    assert_eq!(outcome, CommandOutcome::RunStarted(1));
    assert_eq!(surface.console_text(), "> Running python code...");

    let event = h.next_event().await;
    assert!(h.dispatcher.handle_event(&mut surface, event));

    let result = surface.displayed_result().unwrap();
    assert_eq!(result.stdout, "hi\n");
    assert_eq!(result.exit_status, 0);
    assert_eq!(server.executions()[0].language, LanguageId::Python);
    server.shutdown();
}

#[tokio::test]
async fn test_latest_run_wins_with_out_of_order_responses() {
    let server = MockBackendServer::start().await;
    let mut h = harness(&server, Duration::from_secs(5));
    let mut surface = EditorSurface::default();
    surface.set_language("python").unwrap();

    surface.set_content("sleep:300\nprint('slow')");
    h.dispatcher.dispatch(&mut surface, Command::Run).unwrap();
    surface.set_content("print('fast')");
    h.dispatcher.dispatch(&mut surface, Command::Run).unwrap();

    let first = h.next_event().await;
    assert!(matches!(first, Event::RunFinished { seq: 2, .. }));
    assert!(h.dispatcher.handle_event(&mut surface, first));

    let second = h.next_event().await;
    assert!(matches!(second, Event::RunFinished { seq: 1, .. }));
    assert!(!h.dispatcher.handle_event(&mut surface, second));

    assert_eq!(surface.displayed_seq(), Some(2));
    assert_eq!(surface.displayed_result().unwrap().stdout, "fast\n");
    server.shutdown();
}

#[tokio::test]
async fn test_non_responding_backend_times_out() {
    let server = MockBackendServer::start().await;
    let mut h = harness(&server, Duration::from_millis(150));
    let mut surface = EditorSurface::default();
    surface.set_content("hang");

    h.dispatcher.dispatch(&mut surface, Command::Run).unwrap();
    let event = h.next_event().await;
    h.dispatcher.handle_event(&mut surface, event);

    let result = surface.displayed_result().unwrap();
    assert_eq!(result.exit_status, EXIT_TIMEOUT);
    assert!(result.stderr.contains("timed out after 150 ms"));
    server.shutdown();
}

#[tokio::test]
async fn test_routing_policy_decides_what_reaches_the_backend() {
    let server = MockBackendServer::start().await;
    let mut h = harness(&server, Duration::from_secs(5));
    let mut surface = EditorSurface::default();
    surface.set_language("typescript").unwrap();
    surface.set_content("exit:3");

    h.dispatcher.dispatch(&mut surface, Command::Run).unwrap();
    let event = h.next_event().await;
    h.dispatcher.handle_event(&mut surface, event);
    assert_eq!(surface.displayed_result().unwrap().exit_status, 3);

    // css is not routed at all, so it never reaches the server.
    surface.set_language("css").unwrap();
    h.dispatcher.dispatch(&mut surface, Command::Run).unwrap();
    let event = h.next_event().await;
    h.dispatcher.handle_event(&mut surface, event);
    assert_eq!(surface.displayed_result().unwrap().exit_status, EXIT_UNSUPPORTED);
    assert_eq!(server.executions().len(), 1);
    server.shutdown();
}

#[tokio::test]
async fn test_remote_rejection_maps_to_unsupported_language() {
    let server = MockBackendServer::start().await;
    let executor = HttpCodeExecutor::new(&server.address());

    let err = executor
        .execute_code(&ExecutionRequest::new("<h1>hi</h1>", LanguageId::Html))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::UnsupportedLanguage(LanguageId::Html)));

    let err: EditorError = err.into();
    assert_eq!(err, EditorError::UnsupportedLanguage(LanguageId::Html));
    server.shutdown();
}

#[tokio::test]
async fn test_clear_console_keeps_document() {
    let server = MockBackendServer::start().await;
    let mut h = harness(&server, Duration::from_secs(5));
    let mut surface = EditorSurface::default();
    surface.set_content("print('x')");

    h.dispatcher.dispatch(&mut surface, Command::Run).unwrap();
    let event = h.next_event().await;
    h.dispatcher.handle_event(&mut surface, event);
    assert!(surface.displayed_result().is_some());

    let outcome = h
        .dispatcher
        .dispatch(&mut surface, Command::ClearConsole)
        .unwrap();
    assert_eq!(outcome, CommandOutcome::ConsoleCleared);
    assert!(surface.displayed_result().is_none());
    assert_eq!(surface.content(), "print('x')");
    server.shutdown();
}

#[tokio::test]
async fn test_save_without_session() {
    let server = MockBackendServer::start().await;
    let mut h = harness(&server, Duration::from_secs(5));
    h.sessions.invalidate();
    let mut surface = EditorSurface::default();
    surface.set_content("print('unsaved')");

    let err = h.dispatcher.dispatch(&mut surface, Command::Save).unwrap_err();
    assert_eq!(err, EditorError::NotAuthenticated);
    assert!(surface.is_dirty());
    assert!(surface.notice().is_none());
    assert!(server.saves().is_empty());
    server.shutdown();
}

#[tokio::test]
async fn test_remote_save_success_and_rejection() {
    let server = MockBackendServer::start().await;
    let mut h = harness(&server, Duration::from_secs(5));
    let mut surface = EditorSurface::default();

    surface.set_content("print('keep')");
    h.dispatcher.dispatch(&mut surface, Command::Save).unwrap();
    let event = h.next_event().await;
    h.dispatcher.handle_event(&mut surface, event);
    assert!(!surface.is_dirty());
    assert_eq!(surface.take_notice().unwrap().level, NoticeLevel::Info);

    let saved = &server.saves()[0];
    assert_eq!(saved.content, "print('keep')");
    assert_eq!(saved.session_id, h.sessions.get_session().unwrap().id);

    surface.set_content("reject me");
    h.dispatcher.dispatch(&mut surface, Command::Save).unwrap();
    let event = h.next_event().await;
    h.dispatcher.handle_event(&mut surface, event);
    assert!(surface.is_dirty());
    let notice = surface.take_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Save failed: quota exceeded");
    server.shutdown();
}

#[tokio::test]
async fn test_edit_during_save_keeps_document_dirty() {
    let store = MemoryDocumentStore::new().with_delay(Duration::from_millis(100));
    let mut h = Harness::new(
        "http://127.0.0.1:9",
        Duration::from_secs(1),
        Arc::new(store.clone()),
        LogoutPolicy::Confirm,
    );
    let mut surface = EditorSurface::default();

    surface.set_content("v1");
    let outcome = h.dispatcher.dispatch(&mut surface, Command::Save).unwrap();
    surface.set_content("v2");

    let event = h.next_event().await;
    assert!(matches!(
        event,
        Event::SaveFinished { version, .. } if outcome == CommandOutcome::SaveQueued(version)
    ));
    h.dispatcher.handle_event(&mut surface, event);
    assert!(surface.is_dirty());
    assert_eq!(surface.content(), "v2");
}

#[tokio::test]
async fn test_logout_cancels_in_flight_work() {
    let server = MockBackendServer::start().await;
    let mut h = harness(&server, Duration::from_secs(10));
    let mut surface = EditorSurface::default();
    surface.set_content("hang");

    h.dispatcher.dispatch(&mut surface, Command::Run).unwrap();
    let outcome = h
        .dispatcher
        .dispatch(&mut surface, Command::Logout { discard_unsaved: true })
        .unwrap();
    assert_eq!(outcome, CommandOutcome::LoggedOut);
    assert!(h.sessions.get_session().is_none());
    assert_eq!(h.navigator.current().as_deref(), Some(ENTRY_PATH));

    let next = tokio::time::timeout(Duration::from_millis(300), h.events.recv()).await;
    assert!(!matches!(next, Ok(Some(_))));
    server.shutdown();
}

#[tokio::test]
async fn test_remote_backend_health_check() {
    let server = MockBackendServer::start().await;
    let executor = HttpCodeExecutor::new(&format!("{}/", server.address()));
    executor.health_check().await.unwrap();

    let unreachable =
        HttpCodeExecutor::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
    assert!(unreachable.health_check().await.is_err());
}
