//! `/click`, `/click/element`, `/scroll`.

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::resolve_pid;
use crate::server::AppState;
use axum::extract::State;
use axum::Json;
use marionette::types::parse_modifiers;
use marionette::{element, ElementQuery, MouseButton, UIElementInfo};
use serde::{Deserialize, Serialize};

fn parse_button(raw: Option<&str>) -> ApiResult<MouseButton> {
    match raw.unwrap_or("left") {
        "left" => Ok(MouseButton::Left),
        "right" => Ok(MouseButton::Right),
        "center" | "middle" => Ok(MouseButton::Center),
        other => Err(ApiError::Validation(format!(
            "Invalid button '{other}': must be 'left', 'right' or 'center'"
        ))),
    }
}

#[derive(Deserialize)]
pub struct ClickRequest {
    pub x: f64,
    pub y: f64,
    pub button: Option<String>,
    pub click_count: Option<u32>,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

#[derive(Serialize)]
pub struct ClickResponse {
    pub success: bool,
    pub x: f64,
    pub y: f64,
    pub button: MouseButton,
    pub click_count: u32,
}

pub async fn click(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ClickRequest>,
) -> ApiResult<Json<ClickResponse>> {
    if req.x < 0.0 || req.y < 0.0 {
        return Err(ApiError::Validation(format!(
            "Coordinates must be non-negative, got ({}, {})",
            req.x, req.y
        )));
    }
    let button = parse_button(req.button.as_deref())?;
    let click_count = req.click_count.unwrap_or(1).max(1);
    let flags = parse_modifiers(&req.modifiers)?;

    let (x, y) = (req.x, req.y);
    state
        .platform
        .call(move |p| p.mouse_click(x, y, button, click_count, flags))
        .await?;

    Ok(Json(ClickResponse {
        success: true,
        x,
        y,
        button,
        click_count,
    }))
}

#[derive(Deserialize)]
pub struct ClickElementRequest {
    pub title: Option<String>,
    pub title_contains: Option<String>,
    pub role: Option<String>,
    pub label: Option<String>,
    pub pid: Option<i32>,
    #[serde(default)]
    pub use_accessibility_action: bool,
    pub button: Option<String>,
}

#[derive(Serialize)]
pub struct ClickedAt {
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize)]
pub struct ClickElementResponse {
    pub success: bool,
    pub element: UIElementInfo,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clicked_at: Option<ClickedAt>,
}

pub async fn click_element(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ClickElementRequest>,
) -> ApiResult<Json<ClickElementResponse>> {
    let query = ElementQuery {
        role: req.role.clone(),
        title: req.title.clone(),
        title_contains: req.title_contains.clone(),
        label_contains: req.label.clone(),
        ..Default::default()
    };
    if !query.has_predicates() {
        return Err(ApiError::Validation(
            "At least one of 'title', 'title_contains', 'role' or 'label' is required".to_string(),
        ));
    }
    let pid = resolve_pid(&state, req.pid).await?;
    let button = parse_button(req.button.as_deref())?;
    let use_ax = req.use_accessibility_action;

    let (info, clicked_at) = state
        .platform
        .call(move |p| {
            let root = p.app_element(pid)?;
            let (path, node) = element::query_first(root, pid, &query)?;
            let info = element::element_info(node.as_ref(), path, 0);
            if use_ax {
                node.perform("AXPress")?;
                return Ok((info, None));
            }
            let frame = info.frame.ok_or_else(|| {
                marionette::AutomationError::ElementNotFound(format!(
                    "Element '{}' has no frame to click",
                    info.title.as_deref().unwrap_or(&info.role)
                ))
            })?;
            let (x, y) = frame.center();
            p.mouse_click(x, y, button, 1, Default::default())?;
            Ok((info, Some((x, y))))
        })
        .await?;

    Ok(Json(ClickElementResponse {
        success: true,
        element: info,
        method: if use_ax { "accessibility" } else { "mouse" },
        clicked_at: clicked_at.map(|(x, y)| ClickedAt { x, y }),
    }))
}

#[derive(Deserialize)]
pub struct ScrollRequest {
    #[serde(default)]
    pub delta_x: f64,
    #[serde(default)]
    pub delta_y: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub pid: Option<i32>,
    pub path: Option<marionette::ElementPath>,
}

#[derive(Serialize)]
pub struct ScrollResponse {
    pub success: bool,
    pub x: f64,
    pub y: f64,
    pub delta_x: f64,
    pub delta_y: f64,
}

pub async fn scroll(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ScrollRequest>,
) -> ApiResult<Json<ScrollResponse>> {
    if req.delta_x == 0.0 && req.delta_y == 0.0 {
        return Err(ApiError::Validation(
            "At least one of 'delta_x' or 'delta_y' must be non-zero".to_string(),
        ));
    }
    let (delta_x, delta_y) = (req.delta_x, req.delta_y);

    if let Some(path) = req.path {
        // Element-targeted: scroll at the element's center, delivered to
        // the owning process.
        let (x, y) = state
            .platform
            .call(move |p| {
                let root = p.app_element(path.pid)?;
                let node = element::navigate(root, &path.path)?;
                let frame = node.frame().ok_or_else(|| {
                    marionette::AutomationError::ElementNotFound(
                        "Element has no frame to scroll at".to_string(),
                    )
                })?;
                let (x, y) = frame.center();
                p.scroll_to_pid(path.pid, x, y, delta_x, delta_y)?;
                Ok((x, y))
            })
            .await?;
        return Ok(Json(ScrollResponse {
            success: true,
            x,
            y,
            delta_x,
            delta_y,
        }));
    }

    let (x, y) = match (req.x, req.y) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(ApiError::Validation(
                "'x' and 'y' are required when no 'path' is given".to_string(),
            ));
        }
    };

    if let Some(pid) = req.pid {
        state
            .platform
            .call(move |p| p.scroll_to_pid(pid, x, y, delta_x, delta_y))
            .await?;
    } else {
        state
            .platform
            .call(move |p| p.scroll(x, y, delta_x, delta_y))
            .await?;
    }

    Ok(Json(ScrollResponse {
        success: true,
        x,
        y,
        delta_x,
        delta_y,
    }))
}
