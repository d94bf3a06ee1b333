//! Per-endpoint request handlers.

pub mod input;
pub mod menu;
pub mod screenshot;
pub mod status;
pub mod tree;
pub mod typing;
pub mod wait;

use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

/// Scoping policy: an explicit `pid` wins, then the bound target app, then
/// the frontmost application.
pub async fn resolve_pid(state: &AppState, explicit: Option<i32>) -> ApiResult<i32> {
    if let Some(pid) = explicit {
        return Ok(pid);
    }
    if let Some(target) = &state.target {
        return Ok(target.pid);
    }
    let frontmost = state.platform.call(|p| p.frontmost_app()).await?;
    frontmost.map(|app| app.pid).ok_or_else(|| {
        ApiError::Resolution(
            "No target application: provide 'pid' or start the server with 'run'".to_string(),
        )
    })
}
