//! Bounded polling of the accessibility tree against a predicate.
//!
//! A timeout here is a reported outcome, not an error: callers compose waits
//! into scripts and branch on `condition_met` instead of catching failures.

use crate::element;
use crate::errors::AutomationError;
use crate::executor::PlatformHandle;
use crate::types::{ElementQuery, UIElementInfo, WaitCondition};
use std::time::{Duration, Instant};

pub const MIN_TIMEOUT_MS: u64 = 1;
pub const MAX_TIMEOUT_MS: u64 = 60_000;
pub const MIN_POLL_INTERVAL_MS: u64 = 1;
pub const MAX_POLL_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct WaitOutcome {
    pub condition_met: bool,
    pub waited_ms: u64,
    /// The matched element, or on timeout the last element seen (if any) to
    /// aid debugging.
    pub element: Option<UIElementInfo>,
}

/// One evaluation of the query + condition against the live tree. A target
/// application that has disappeared counts as zero matches.
async fn evaluate(
    platform: &PlatformHandle,
    pid: i32,
    query: &ElementQuery,
    condition: WaitCondition,
) -> Result<(bool, Option<UIElementInfo>), AutomationError> {
    let query = query.clone();
    platform
        .call(move |p| {
            let root = match p.app_element(pid) {
                Ok(root) => root,
                Err(_) => {
                    return Ok((condition == WaitCondition::NotExists, None));
                }
            };
            let mut found = element::query_all(root, &query, 1).into_iter().next();
            let info = found.take().map(|(indices, node)| {
                element::element_info(
                    node.as_ref(),
                    crate::types::ElementPath::new(pid, indices),
                    0,
                )
            });
            let met = match condition {
                WaitCondition::Exists => info.is_some(),
                WaitCondition::NotExists => info.is_none(),
                WaitCondition::Enabled => info.as_ref().is_some_and(|i| i.is_enabled),
                WaitCondition::Focused => info.as_ref().is_some_and(|i| i.is_focused),
            };
            Ok((met, info))
        })
        .await
}

/// Poll until the condition holds or the deadline passes. Interval and
/// timeout are assumed pre-validated against the bounds above.
pub async fn wait_for(
    platform: &PlatformHandle,
    pid: i32,
    query: &ElementQuery,
    condition: WaitCondition,
    timeout_ms: u64,
    poll_interval_ms: u64,
) -> Result<WaitOutcome, AutomationError> {
    let start = Instant::now();
    let deadline = Duration::from_millis(timeout_ms);
    let mut last_seen: Option<UIElementInfo> = None;

    loop {
        let (met, info) = evaluate(platform, pid, query, condition).await?;
        if info.is_some() {
            last_seen = info.clone();
        }
        if met {
            return Ok(WaitOutcome {
                condition_met: true,
                waited_ms: start.elapsed().as_millis() as u64,
                element: info,
            });
        }
        if start.elapsed() >= deadline {
            return Ok(WaitOutcome {
                condition_met: false,
                waited_ms: start.elapsed().as_millis() as u64,
                element: last_seen,
            });
        }
        tokio::time::sleep(Duration::from_millis(poll_interval_ms)).await;
    }
}
