//! `/wait`: bounded polling with timeouts as reported outcomes.

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::resolve_pid;
use crate::server::AppState;
use axum::Json;
use axum::extract::State;
use marionette::wait::{
    wait_for, MAX_POLL_INTERVAL_MS, MAX_TIMEOUT_MS, MIN_POLL_INTERVAL_MS, MIN_TIMEOUT_MS,
};
use marionette::{ElementQuery, UIElementInfo, WaitCondition};
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

#[derive(Deserialize)]
pub struct WaitRequest {
    pub title: Option<String>,
    pub title_contains: Option<String>,
    pub role: Option<String>,
    pub label: Option<String>,
    pub pid: Option<i32>,
    pub timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub condition: Option<WaitCondition>,
}

#[derive(Serialize)]
pub struct WaitResponse {
    pub success: bool,
    pub condition_met: bool,
    pub condition: WaitCondition,
    pub waited_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<UIElementInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> ApiResult<u64> {
    if value < min || value > max {
        return Err(ApiError::Validation(format!(
            "'{name}' must be between {min} and {max}, got {value}"
        )));
    }
    Ok(value)
}

pub async fn wait(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<WaitRequest>,
) -> ApiResult<Json<WaitResponse>> {
    let query = ElementQuery {
        role: req.role.clone(),
        title: req.title.clone(),
        title_contains: req.title_contains.clone(),
        label_contains: req.label.clone(),
        ..Default::default()
    };
    if !query.has_predicates() {
        return Err(ApiError::Validation(
            "At least one search criteria is required (title, title_contains, role, label)"
                .to_string(),
        ));
    }
    let timeout_ms = check_range(
        "timeout_ms",
        req.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        MIN_TIMEOUT_MS,
        MAX_TIMEOUT_MS,
    )?;
    let poll_interval_ms = check_range(
        "poll_interval_ms",
        req.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        MIN_POLL_INTERVAL_MS,
        MAX_POLL_INTERVAL_MS,
    )?;
    let condition = req.condition.unwrap_or_default();
    let pid = resolve_pid(&state, req.pid).await?;

    let outcome = wait_for(
        &state.platform,
        pid,
        &query,
        condition,
        timeout_ms,
        poll_interval_ms,
    )
    .await?;

    // A timeout is an outcome, not a transport error: still success=true,
    // with the error string carried for scripts that want to log it.
    let error = if outcome.condition_met {
        None
    } else {
        Some(format!(
            "Timeout: condition '{condition:?}' not met after {timeout_ms}ms",
        ))
    };
    Ok(Json(WaitResponse {
        success: true,
        condition_met: outcome.condition_met,
        condition,
        waited_ms: outcome.waited_ms,
        element: outcome.element,
        error,
    }))
}
