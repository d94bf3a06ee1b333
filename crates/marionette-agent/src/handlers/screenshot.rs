//! `/screenshot`: display and window capture.
//!
//! Selection order: `app` (or the bound target app) wins, then `windowId`,
//! then the full display. PNG/JPEG come back as raw bytes with the proper
//! content type; `base64` wraps the PNG in a JSON envelope.

use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use marionette::{CaptureResult, WindowInfo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageFormat {
    Png,
    Base64,
    Jpeg,
}

impl ImageFormat {
    fn parse(raw: Option<&str>) -> ApiResult<Self> {
        match raw.unwrap_or("png") {
            "png" => Ok(ImageFormat::Png),
            "base64" => Ok(ImageFormat::Base64),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            other => Err(ApiError::Validation(format!(
                "Invalid format '{other}': must be 'png', 'base64' or 'jpeg'"
            ))),
        }
    }
}

#[derive(Deserialize)]
pub struct ScreenshotQuery {
    pub format: Option<String>,
    pub display: Option<u32>,
    pub app: Option<String>,
    #[serde(rename = "windowId")]
    pub window_id: Option<u32>,
}

#[derive(Serialize)]
struct WindowBlock {
    id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    app: String,
}

#[derive(Serialize)]
struct Base64Response {
    success: bool,
    format: &'static str,
    width: u32,
    height: u32,
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    window: Option<WindowBlock>,
}

/// First window owned by an app whose name contains `needle`
/// (case-insensitively), preferring on-screen windows.
fn pick_app_window(windows: &[WindowInfo], needle: &str) -> Option<WindowInfo> {
    let needle = needle.to_lowercase();
    let owned: Vec<&WindowInfo> = windows
        .iter()
        .filter(|w| w.app_name.to_lowercase().contains(&needle))
        .collect();
    owned
        .iter()
        .find(|w| w.is_on_screen)
        .or_else(|| owned.first())
        .map(|w| (*w).clone())
}

pub async fn screenshot(
    State(state): State<AppState>,
    Query(query): Query<ScreenshotQuery>,
) -> ApiResult<Response> {
    let format = ImageFormat::parse(query.format.as_deref())?;

    // Scoping: an explicit app wins; with none given, a bound target app
    // stands in for it, unless the caller asked for a specific window or
    // display instead.
    let app = query.app.clone().or_else(|| {
        if query.window_id.is_none() && query.display.is_none() {
            state.target.as_ref().map(|t| t.name.clone())
        } else {
            None
        }
    });

    let (capture, window) = if let Some(app_name) = app {
        let needle = app_name.clone();
        state
            .platform
            .call(move |p| {
                let windows = p.windows(true)?;
                let window = pick_app_window(&windows, &needle).ok_or_else(|| {
                    marionette::AutomationError::ElementNotFound(format!(
                        "No window found for app '{needle}'"
                    ))
                })?;
                let capture = p.capture_window(window.window_id)?;
                Ok((capture, Some(window)))
            })
            .await?
    } else if let Some(window_id) = query.window_id {
        state
            .platform
            .call(move |p| {
                let windows = p.windows(true)?;
                let window = windows.iter().find(|w| w.window_id == window_id).cloned();
                let capture = p.capture_window(window_id)?;
                Ok((capture, window))
            })
            .await?
    } else {
        let display = query.display;
        let capture = state
            .platform
            .call(move |p| p.capture_display(display))
            .await?;
        (capture, None)
    };

    encode_response(format, capture, window)
}

fn encode_response(
    format: ImageFormat,
    capture: CaptureResult,
    window: Option<WindowInfo>,
) -> ApiResult<Response> {
    let encode_err =
        |e: marionette::screenshot::EncodeError| ApiError::Adapter(e.to_string());
    match format {
        ImageFormat::Png => {
            let bytes = capture.to_png().map_err(encode_err)?;
            Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
        }
        ImageFormat::Jpeg => {
            let bytes = capture.to_jpeg().map_err(encode_err)?;
            Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
        }
        ImageFormat::Base64 => {
            let data = capture.to_base64_png().map_err(encode_err)?;
            Ok(Json(Base64Response {
                success: true,
                format: "base64",
                width: capture.width,
                height: capture.height,
                data,
                window: window.map(|w| WindowBlock {
                    id: w.window_id,
                    title: w.title,
                    app: w.app_name,
                }),
            })
            .into_response())
        }
    }
}
