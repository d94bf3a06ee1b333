//! Shared harness: a router wired to the recording fake platform.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use marionette::platforms::fake::{FakeNodeSpec, FakePlatform, FakeState};
use marionette::{PlatformHandle, TargetApp};
use marionette_agent::server::{build_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const APP_PID: i32 = 1234;
pub const APP_NAME: &str = "TestApp";

/// The standard fixture tree: a window with OK/Cancel buttons and an Email
/// text field.
pub fn standard_tree() -> FakeNodeSpec {
    FakeNodeSpec::app(APP_NAME).children(vec![FakeNodeSpec::window("Main")
        .frame(0.0, 0.0, 800.0, 600.0)
        .children(vec![
            FakeNodeSpec::button("OK").frame(100.0, 200.0, 80.0, 40.0),
            FakeNodeSpec::button("Cancel").frame(200.0, 200.0, 80.0, 40.0),
            FakeNodeSpec::text_field("Email")
                .label("Email address")
                .frame(100.0, 100.0, 200.0, 24.0),
        ])])
}

pub fn fake_state() -> Arc<FakeState> {
    Arc::new(FakeState::with_tree(APP_PID, APP_NAME, standard_tree()))
}

pub fn spawn_platform(state: Arc<FakeState>) -> PlatformHandle {
    PlatformHandle::spawn(move || Box::new(FakePlatform::new(state)) as _)
}

/// Router bound to the fake platform, with the fixture app as the target.
pub fn router(state: &Arc<FakeState>) -> Router {
    let app = state.app_info();
    let app_state = AppState::new(
        spawn_platform(state.clone()),
        Some(TargetApp {
            name: app.name,
            pid: app.pid,
            bundle_id: app.bundle_id,
        }),
    );
    build_router(app_state)
}

/// Router with no bound target app.
pub fn router_unscoped(state: &Arc<FakeState>) -> Router {
    build_router(AppState::new(spawn_platform(state.clone()), None))
}

pub async fn get(router: &Router, path: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("non-JSON body for GET {path}: {e}"));
    (status, value)
}

pub async fn get_raw(router: &Router, path: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes.to_vec())
}

pub async fn post_json(router: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("non-JSON body for POST {path}: {e}"));
    (status, value)
}

pub async fn post_raw_body(router: &Router, path: &str, body: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
