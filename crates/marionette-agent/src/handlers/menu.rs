//! `/menu`: menu-tree snapshots and title-path triggering.

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::resolve_pid;
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::Json;
use marionette::{element, MenuItemInfo};
use serde::{Deserialize, Serialize};

/// Menu bars are shallow; File > Export > PDF style nesting rarely goes
/// past three levels, five covers pathological apps.
const MENU_DEPTH: usize = 5;

#[derive(Deserialize)]
pub struct MenuTreeQuery {
    pub pid: Option<i32>,
}

#[derive(Serialize)]
pub struct MenuTreeResponse {
    pub success: bool,
    pub menus: Vec<MenuItemInfo>,
}

pub async fn menu_tree(
    State(state): State<AppState>,
    Query(query): Query<MenuTreeQuery>,
) -> ApiResult<Json<MenuTreeResponse>> {
    let pid = resolve_pid(&state, query.pid).await?;
    let menus = state
        .platform
        .call(move |p| {
            let bar = p.menu_bar(pid)?;
            Ok(element::menu_tree(bar.as_ref(), 0, MENU_DEPTH))
        })
        .await?;
    Ok(Json(MenuTreeResponse {
        success: true,
        menus,
    }))
}

#[derive(Deserialize)]
pub struct TriggerMenuRequest {
    /// Ordered titles from the top-level menu down to the item, each
    /// matched as a case-insensitive substring.
    pub path: Vec<String>,
    /// Skip app activation, leaving the target in the background.
    #[serde(default)]
    pub background: bool,
    pub pid: Option<i32>,
}

#[derive(Serialize)]
pub struct TriggerMenuResponse {
    pub success: bool,
    pub path: Vec<String>,
    pub triggered: String,
}

pub async fn trigger_menu(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TriggerMenuRequest>,
) -> ApiResult<Json<TriggerMenuResponse>> {
    if req.path.is_empty() || req.path.iter().any(|t| t.is_empty()) {
        return Err(ApiError::Validation(
            "'path' must be a non-empty list of non-empty menu titles".to_string(),
        ));
    }
    let pid = resolve_pid(&state, req.pid).await?;

    if !req.background {
        state.platform.call(move |p| p.activate(pid)).await?;
    }

    let titles = req.path.clone();
    let triggered = state
        .platform
        .call(move |p| {
            let bar = p.menu_bar(pid)?;
            let item = element::resolve_menu_path(bar, &titles)?;
            let title = item.title().unwrap_or_default();
            item.perform("AXPress")?;
            Ok(title)
        })
        .await?;

    Ok(Json(TriggerMenuResponse {
        success: true,
        path: req.path,
        triggered,
    }))
}
