//! `/type` and `/key`: the three-way dispatch between accessibility value
//! replacement, process-targeted synthesis, and global synthesis.
//!
//! Mode resolution for `/type` (the authoritative table):
//!
//! | mode      | targeting          | behavior                                  |
//! |-----------|--------------------|-------------------------------------------|
//! | `replace` | `path`             | `setValue` on that node, atomic            |
//! | `replace` | query params       | resolve query, `setValue` on first match   |
//! | `replace` | none               | global synthesized typing                  |
//! | `keys`    | `pid`/`path`/query | focus match (if query), then per-character |
//! |           |                    | key events targeted at the process         |
//! | `keys`    | none               | global per-character key synthesis         |

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::resolve_pid;
use crate::server::AppState;
use axum::extract::State;
use axum::Json;
use marionette::keymap;
use marionette::types::parse_modifiers;
use marionette::{element, ElementPath, ElementQuery, ModifierFlags, TypeMode, UIElementInfo};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Deserialize)]
pub struct TypeRequest {
    pub text: String,
    pub delay_ms: Option<u64>,
    pub mode: Option<String>,
    pub pid: Option<i32>,
    pub path: Option<ElementPath>,
    pub role: Option<String>,
    pub title: Option<String>,
    pub title_contains: Option<String>,
}

#[derive(Serialize)]
pub struct TypeResponse {
    pub success: bool,
    pub mode: TypeMode,
    pub method: &'static str,
    pub characters_typed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<UIElementInfo>,
}

fn parse_mode(raw: Option<&str>) -> ApiResult<TypeMode> {
    match raw.unwrap_or("replace") {
        "replace" => Ok(TypeMode::Replace),
        "keys" => Ok(TypeMode::Keys),
        other => Err(ApiError::Validation(format!(
            "Invalid mode '{other}': must be 'replace' or 'keys'"
        ))),
    }
}

/// Synthesize one character as key events. Mapped characters become a
/// down/up pair with the shift flag; unmapped ones carry the character as a
/// Unicode payload on a keycode-0 event.
fn type_char(
    p: &dyn marionette::Platform,
    pid: Option<i32>,
    ch: char,
) -> Result<(), marionette::AutomationError> {
    let (keycode, flags, unicode) = match keymap::keystroke_for_char(ch) {
        Some(stroke) => (
            stroke.keycode,
            ModifierFlags::default().with_shift(stroke.shift),
            None,
        ),
        None => (0, ModifierFlags::default(), Some(ch.to_string())),
    };
    let unicode = unicode.as_deref();
    match pid {
        Some(pid) => {
            p.key_event_to_pid(pid, keycode, true, flags, unicode)?;
            p.key_event_to_pid(pid, keycode, false, flags, unicode)?;
        }
        None => {
            p.key_event(keycode, true, flags, unicode)?;
            p.key_event(keycode, false, flags, unicode)?;
        }
    }
    Ok(())
}

/// Per-character synthesis loop. The inter-character delay is an async
/// sleep between executor calls, so other requests interleave at character
/// granularity rather than stalling behind a sleeping adapter.
async fn synthesize_text(
    state: &AppState,
    pid: Option<i32>,
    text: &str,
    delay_ms: u64,
) -> ApiResult<usize> {
    let mut typed = 0usize;
    for ch in text.chars() {
        if typed > 0 && delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        state.platform.call(move |p| type_char(p, pid, ch)).await?;
        typed += 1;
    }
    Ok(typed)
}

pub async fn type_text(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TypeRequest>,
) -> ApiResult<Json<TypeResponse>> {
    if req.text.is_empty() {
        return Err(ApiError::Validation("Text must not be empty".to_string()));
    }
    let mode = parse_mode(req.mode.as_deref())?;
    let delay_ms = req.delay_ms.unwrap_or(0);
    let char_count = req.text.chars().count();

    let query = ElementQuery {
        role: req.role.clone(),
        title: req.title.clone(),
        title_contains: req.title_contains.clone(),
        ..Default::default()
    };

    match mode {
        TypeMode::Replace => {
            if let Some(path) = req.path {
                let text = req.text.clone();
                let info = state
                    .platform
                    .call(move |p| {
                        let root = p.app_element(path.pid)?;
                        let node = element::navigate(root, &path.path)?;
                        node.set_value(&text)?;
                        Ok(element::element_info(node.as_ref(), path, 0))
                    })
                    .await?;
                return Ok(Json(TypeResponse {
                    success: true,
                    mode,
                    method: "set_value",
                    characters_typed: char_count,
                    element: Some(info),
                }));
            }
            if query.has_predicates() {
                let pid = resolve_pid(&state, req.pid).await?;
                let text = req.text.clone();
                let info = state
                    .platform
                    .call(move |p| {
                        let root = p.app_element(pid)?;
                        let (path, node) = element::query_first(root, pid, &query)?;
                        node.set_value(&text)?;
                        Ok(element::element_info(node.as_ref(), path, 0))
                    })
                    .await?;
                return Ok(Json(TypeResponse {
                    success: true,
                    mode,
                    method: "set_value",
                    characters_typed: char_count,
                    element: Some(info),
                }));
            }
            // No target to replace into: fall through to global typing.
            let typed = synthesize_text(&state, None, &req.text, delay_ms).await?;
            Ok(Json(TypeResponse {
                success: true,
                mode,
                method: "keystrokes",
                characters_typed: typed,
                element: None,
            }))
        }
        TypeMode::Keys => {
            let has_target = req.pid.is_some() || req.path.is_some() || query.has_predicates();
            if !has_target {
                let typed = synthesize_text(&state, None, &req.text, delay_ms).await?;
                return Ok(Json(TypeResponse {
                    success: true,
                    mode,
                    method: "keystrokes",
                    characters_typed: typed,
                    element: None,
                }));
            }

            let pid = match &req.path {
                Some(path) => path.pid,
                None => resolve_pid(&state, req.pid).await?,
            };

            // An element query means "focus this element first, then type".
            let element = if query.has_predicates() {
                let focus_query = query.clone();
                let info = state
                    .platform
                    .call(move |p| {
                        let root = p.app_element(pid)?;
                        let (path, node) = element::query_first(root, pid, &focus_query)?;
                        node.focus()?;
                        Ok(element::element_info(node.as_ref(), path, 0))
                    })
                    .await?;
                Some(info)
            } else {
                None
            };

            let typed = synthesize_text(&state, Some(pid), &req.text, delay_ms).await?;
            Ok(Json(TypeResponse {
                success: true,
                mode,
                method: "keystrokes",
                characters_typed: typed,
                element,
            }))
        }
    }
}

#[derive(Deserialize)]
pub struct KeyRequest {
    pub key: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub pid: Option<i32>,
    pub path: Option<ElementPath>,
}

#[derive(Serialize)]
pub struct KeyResponse {
    pub success: bool,
    pub key: String,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
}

/// Keys that map onto accessibility actions when the target is an element
/// path rather than an event stream.
fn path_action_for_key(key: &str) -> Option<&'static str> {
    match key.to_ascii_lowercase().as_str() {
        "return" | "enter" => Some("AXConfirm"),
        "escape" | "esc" => Some("AXCancel"),
        "space" => Some("AXPress"),
        _ => None,
    }
}

const MODIFIER_KEYCODES: &[(fn(&ModifierFlags) -> bool, u16)] = &[
    (|f| f.cmd, 55),
    (|f| f.shift, 56),
    (|f| f.alt, 58),
    (|f| f.ctrl, 59),
    (|f| f.function, 63),
];

pub async fn key(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<KeyRequest>,
) -> ApiResult<Json<KeyResponse>> {
    if req.key.is_empty() {
        return Err(ApiError::Validation("Key must not be empty".to_string()));
    }
    let flags = parse_modifiers(&req.modifiers)?;

    if let Some(path) = req.path {
        let Some(action) = path_action_for_key(&req.key) else {
            return Err(ApiError::Resolution(format!(
                "Key '{}' cannot be delivered to an element path. Supported keys with a path: \
                 return, enter, escape, space. Use 'pid' to synthesize arbitrary keys.",
                req.key
            )));
        };
        state
            .platform
            .call(move |p| {
                let root = p.app_element(path.pid)?;
                let node = element::navigate(root, &path.path)?;
                node.perform(action)
            })
            .await?;
        return Ok(Json(KeyResponse {
            success: true,
            key: req.key,
            method: "accessibility",
            action: Some(action),
        }));
    }

    let stroke = keymap::keycode_for_name(&req.key).ok_or_else(|| {
        ApiError::Validation(format!(
            "Unknown key '{}': use a named key (return, tab, escape, arrow keys, f1-f12) \
             or a single character",
            req.key
        ))
    })?;
    let flags = flags.with_shift(stroke.shift);

    if let Some(pid) = req.pid {
        // Targeted: physically press the modifier keys around the
        // keystroke so apps that track key state see a coherent sequence.
        state
            .platform
            .call(move |p| {
                for (active, keycode) in MODIFIER_KEYCODES {
                    if active(&flags) {
                        p.key_event_to_pid(pid, *keycode, true, flags, None)?;
                    }
                }
                p.key_event_to_pid(pid, stroke.keycode, true, flags, None)?;
                p.key_event_to_pid(pid, stroke.keycode, false, flags, None)?;
                for (active, keycode) in MODIFIER_KEYCODES.iter().rev() {
                    if active(&flags) {
                        p.key_event_to_pid(pid, *keycode, false, ModifierFlags::default(), None)?;
                    }
                }
                Ok(())
            })
            .await?;
        return Ok(Json(KeyResponse {
            success: true,
            key: req.key,
            method: "pid",
            action: None,
        }));
    }

    state
        .platform
        .call(move |p| {
            p.key_event(stroke.keycode, true, flags, None)?;
            p.key_event(stroke.keycode, false, flags, None)
        })
        .await?;
    Ok(Json(KeyResponse {
        success: true,
        key: req.key,
        method: "global",
        action: None,
    }))
}
