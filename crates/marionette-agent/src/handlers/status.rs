//! `/`, `/health`, `/status`, `/apps`, `/windows`, `/quit`.

use crate::error::ApiResult;
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::Json;
use marionette::{AppInfo, TargetApp, WindowInfo};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn api_descriptor() -> Json<Value> {
    Json(json!({
        "name": "marionette-agent",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            { "method": "GET",  "path": "/status", "description": "Server, permission, and target-app status" },
            { "method": "GET",  "path": "/screenshot", "description": "Capture a display or window" },
            { "method": "POST", "path": "/click", "description": "Global mouse click at coordinates" },
            { "method": "POST", "path": "/click/element", "description": "Click an element matched by query" },
            { "method": "POST", "path": "/type", "description": "Insert text via setValue or keystrokes" },
            { "method": "POST", "path": "/key", "description": "Press a named key" },
            { "method": "POST", "path": "/scroll", "description": "Scroll at coordinates or an element" },
            { "method": "POST", "path": "/wait", "description": "Poll for an element condition" },
            { "method": "GET",  "path": "/accessibility/tree", "description": "Dump the accessibility tree" },
            { "method": "GET",  "path": "/accessibility/element", "description": "Inspect one element by path" },
            { "method": "GET",  "path": "/accessibility/elements", "description": "Query elements" },
            { "method": "GET",  "path": "/accessibility/focused", "description": "The focused element" },
            { "method": "POST", "path": "/accessibility/action", "description": "Invoke an accessibility action" },
            { "method": "GET",  "path": "/menu", "description": "The application menu tree" },
            { "method": "POST", "path": "/menu", "description": "Trigger a menu item by title path" },
            { "method": "GET",  "path": "/apps", "description": "Running applications" },
            { "method": "GET",  "path": "/windows", "description": "On-screen windows" },
            { "method": "POST", "path": "/quit", "description": "Shut the server down" },
            { "method": "GET",  "path": "/health", "description": "Liveness probe" },
        ],
    }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub version: String,
    pub server_running: bool,
    pub permissions: Permissions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontmost_app: Option<AppInfo>,
    pub screen_size: ScreenSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_app: Option<TargetApp>,
}

#[derive(Serialize)]
pub struct Permissions {
    pub accessibility: bool,
    pub screen_recording: bool,
}

#[derive(Serialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

pub async fn status(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    let snapshot = state
        .platform
        .call(|p| {
            let accessibility = p.accessibility_granted();
            let screen_recording = p.screen_recording_granted();
            let frontmost = p.frontmost_app().unwrap_or(None);
            let screen = p.main_display_size()?;
            Ok((accessibility, screen_recording, frontmost, screen))
        })
        .await?;
    let (accessibility, screen_recording, frontmost_app, (width, height)) = snapshot;

    Ok(Json(StatusResponse {
        success: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        server_running: true,
        permissions: Permissions {
            accessibility,
            screen_recording,
        },
        frontmost_app,
        screen_size: ScreenSize { width, height },
        target_app: state.target.clone(),
    }))
}

#[derive(Serialize)]
pub struct AppsResponse {
    pub success: bool,
    pub apps: Vec<AppInfo>,
}

pub async fn apps(State(state): State<AppState>) -> ApiResult<Json<AppsResponse>> {
    let apps = state.platform.call(|p| p.running_apps()).await?;
    Ok(Json(AppsResponse {
        success: true,
        apps,
    }))
}

#[derive(Deserialize)]
pub struct WindowsQuery {
    #[serde(default)]
    pub all: bool,
}

#[derive(Serialize)]
pub struct WindowsResponse {
    pub success: bool,
    pub windows: Vec<WindowInfo>,
}

pub async fn windows(
    State(state): State<AppState>,
    Query(query): Query<WindowsQuery>,
) -> ApiResult<Json<WindowsResponse>> {
    let include_offscreen = query.all;
    let windows = state
        .platform
        .call(move |p| p.windows(include_offscreen))
        .await?;
    Ok(Json(WindowsResponse {
        success: true,
        windows,
    }))
}

/// Respond first, exit shortly after, so the caller sees a clean response
/// before the listener goes away.
pub async fn quit(State(state): State<AppState>) -> Json<Value> {
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
    });
    Json(json!({ "success": true }))
}
