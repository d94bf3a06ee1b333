//! The `run` flow: attach/launch, ephemeral ports, watchdog shutdown.

mod common;

use common::*;
use marionette::platforms::fake::{FakeState, RecordedEvent};
use marionette::{AppInfo, AppSpec};
use marionette_agent::lifecycle::{resolve_target, run, spawn_watchdog};
use marionette_agent::server::{AppState, Server, ServerPhase};
use marionette::TargetApp;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn resolve_target_attaches_to_running_app() {
    let state = fake_state();
    let platform = spawn_platform(state.clone());

    let target = resolve_target(&platform, &AppSpec::Name("testapp".into()))
        .await
        .unwrap();
    assert_eq!(target.pid, APP_PID);
    assert_eq!(target.name, APP_NAME);
    // No launch was attempted.
    assert!(state.events().is_empty());
}

#[tokio::test]
async fn resolve_target_launches_when_not_running() {
    let state = Arc::new(FakeState::default_app(1, "SomethingElse"));
    state.set_pending_launch(AppInfo {
        pid: 777,
        name: "Notes".into(),
        bundle_id: Some("com.apple.Notes".into()),
        is_frontmost: false,
    });
    let platform = spawn_platform(state.clone());

    let target = resolve_target(&platform, &AppSpec::Name("Notes".into()))
        .await
        .unwrap();
    assert_eq!(target.pid, 777);
    assert!(state
        .events()
        .iter()
        .any(|e| matches!(e, RecordedEvent::Launch { spec } if spec == "Notes")));
}

#[tokio::test]
async fn resolve_target_fails_when_launch_cannot_satisfy() {
    let state = Arc::new(FakeState::default_app(1, "SomethingElse"));
    let platform = spawn_platform(state.clone());
    let err = resolve_target(&platform, &AppSpec::Name("Ghost".into())).await;
    assert!(err.is_err());
}

async fn http_get(port: u16, path: &str) -> (u16, Value) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw);
    let status: u16 = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let body_start = text.find("\r\n\r\n").map(|i| i + 4).unwrap_or(0);
    let body = serde_json::from_str(text[body_start..].trim()).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn ephemeral_port_server_answers_status_and_dies_with_app() {
    let state = fake_state();
    let platform = spawn_platform(state.clone());
    let app = state.app_info();

    let app_state = AppState::new(
        platform.clone(),
        Some(TargetApp {
            name: app.name.clone(),
            pid: app.pid,
            bundle_id: app.bundle_id.clone(),
        }),
    );
    let shutdown = app_state.shutdown.clone();
    let mut server = Server::new(app_state);
    let addr = server.start("127.0.0.1", 0).await.unwrap();
    assert!(addr.port() > 0);
    assert_eq!(server.phase(), ServerPhase::Running);

    let (status, body) = http_get(addr.port(), "/status").await;
    assert_eq!(status, 200);
    assert_eq!(body["target_app"]["processIdentifier"], APP_PID);

    spawn_watchdog(platform, APP_PID, shutdown);
    state.kill(APP_PID);

    // The watchdog polls once per second; the server must stop within 2s.
    tokio::time::timeout(Duration::from_secs(2), server.wait())
        .await
        .expect("server did not stop after target app exit");
    assert_eq!(server.phase(), ServerPhase::Stopped);
}

#[tokio::test]
async fn run_flow_returns_bootstrap_record_and_exits_on_app_death() {
    let state = fake_state();
    let platform = spawn_platform(state.clone());

    let task = tokio::spawn(run(
        platform,
        AppSpec::Name(APP_NAME.into()),
        "127.0.0.1".into(),
        0,
    ));

    tokio::time::sleep(Duration::from_millis(300)).await;
    state.kill(APP_PID);

    let record = tokio::time::timeout(Duration::from_secs(3), task)
        .await
        .expect("run did not exit after target app death")
        .unwrap()
        .unwrap();
    assert_eq!(record.app, APP_NAME);
    assert_eq!(record.host, "127.0.0.1");
    assert_eq!(record.pid, APP_PID);
    assert!(record.port > 0);
}

#[tokio::test]
async fn quit_endpoint_stops_the_server() {
    let state = fake_state();
    let platform = spawn_platform(state.clone());
    let app = state.app_info();

    let app_state = AppState::new(
        platform,
        Some(TargetApp {
            name: app.name,
            pid: app.pid,
            bundle_id: app.bundle_id,
        }),
    );
    let mut server = Server::new(app_state);
    let addr = server.start("127.0.0.1", 0).await.unwrap();

    let mut stream = TcpStream::connect(("127.0.0.1", addr.port())).await.unwrap();
    let request =
        "POST /quit HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    assert!(String::from_utf8_lossy(&raw).contains("\"success\":true"));

    tokio::time::timeout(Duration::from_secs(2), server.wait())
        .await
        .expect("server did not stop after /quit");
}

#[tokio::test]
async fn restart_rebinds_after_stop() {
    let state = fake_state();
    let platform = spawn_platform(state.clone());
    let mut server = Server::new(AppState::new(platform, None));

    let first = server.start("127.0.0.1", 0).await.unwrap();
    let (status, _) = http_get(first.port(), "/health").await;
    assert_eq!(status, 200);

    let second = server.restart("127.0.0.1", 0).await.unwrap();
    assert_eq!(server.phase(), ServerPhase::Running);
    let (status, _) = http_get(second.port(), "/health").await;
    assert_eq!(status, 200);
    server.stop().await;
    assert_eq!(server.phase(), ServerPhase::Stopped);
}
