//! `/accessibility/*`: tree dumps, element inspection, queries, actions.
//!
//! GET query parameters on this family use the camelCase names existing
//! clients send (`maxDepth`, `rootPath`, `titleContains`, …); response
//! bodies stay lower-snake-case like everything else.

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::handlers::resolve_pid;
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::Json;
use marionette::{
    element, ActionKind, CompactElement, ElementPath, ElementQuery, UIElementInfo,
};
use serde::{Deserialize, Serialize};

const DEFAULT_TREE_DEPTH: usize = 5;
const MAX_TREE_DEPTH: usize = 10;
const DEFAULT_MAX_RESULTS: usize = 50;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeQuery {
    pub pid: Option<i32>,
    pub max_depth: Option<usize>,
    pub format: Option<String>,
    pub include_actions: Option<bool>,
    pub root_path: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum TreeResponse {
    Tree {
        success: bool,
        pid: i32,
        format: &'static str,
        tree: UIElementInfo,
    },
    Compact {
        success: bool,
        pid: i32,
        format: &'static str,
        count: usize,
        elements: Vec<CompactElement>,
    },
}

pub async fn tree(
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> ApiResult<Json<TreeResponse>> {
    let format = query.format.as_deref().unwrap_or("tree");
    if format != "tree" && format != "compact" {
        return Err(ApiError::Validation(format!(
            "Invalid format '{format}': must be 'tree' or 'compact'"
        )));
    }
    let max_depth = query
        .max_depth
        .unwrap_or(DEFAULT_TREE_DEPTH)
        .min(MAX_TREE_DEPTH);
    let root_indices = match &query.root_path {
        Some(raw) => ElementPath::parse_indices(raw).map_err(ApiError::from)?,
        None => Vec::new(),
    };
    let include_actions = query.include_actions.unwrap_or(false);
    let pid = resolve_pid(&state, query.pid).await?;
    let compact = format == "compact";

    let response = state
        .platform
        .call(move |p| {
            let root = p.app_element(pid)?;
            let node = element::navigate(root, &root_indices)?;
            if compact {
                let mut elements = Vec::new();
                element::collect_compact(
                    node.as_ref(),
                    pid,
                    &root_indices,
                    0,
                    max_depth,
                    include_actions,
                    &mut elements,
                );
                Ok(TreeResponse::Compact {
                    success: true,
                    pid,
                    format: "compact",
                    count: elements.len(),
                    elements,
                })
            } else {
                let info = element::element_info(
                    node.as_ref(),
                    ElementPath::new(pid, root_indices),
                    max_depth,
                );
                Ok(TreeResponse::Tree {
                    success: true,
                    pid,
                    format: "tree",
                    tree: info,
                })
            }
        })
        .await?;
    Ok(Json(response))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementQueryParams {
    pub pid: Option<i32>,
    pub path: Option<String>,
    pub child_depth: Option<usize>,
}

#[derive(Serialize)]
pub struct ElementResponse {
    pub success: bool,
    pub element: UIElementInfo,
}

pub async fn element(
    State(state): State<AppState>,
    Query(params): Query<ElementQueryParams>,
) -> ApiResult<Json<ElementResponse>> {
    let pid = params
        .pid
        .ok_or_else(|| ApiError::Validation("'pid' is required".to_string()))?;
    let raw_path = params
        .path
        .ok_or_else(|| ApiError::Validation("'path' is required".to_string()))?;
    let indices = ElementPath::parse_indices(&raw_path).map_err(ApiError::from)?;
    let child_depth = params.child_depth.unwrap_or(0);

    let info = state
        .platform
        .call(move |p| {
            let root = p.app_element(pid)?;
            let node = element::navigate(root, &indices)?;
            Ok(element::element_info(
                node.as_ref(),
                ElementPath::new(pid, indices),
                child_depth,
            ))
        })
        .await?;
    Ok(Json(ElementResponse {
        success: true,
        element: info,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementsQueryParams {
    pub pid: Option<i32>,
    pub role: Option<String>,
    pub title: Option<String>,
    pub title_contains: Option<String>,
    pub label_contains: Option<String>,
    pub value_contains: Option<String>,
    pub max_results: Option<usize>,
}

#[derive(Serialize)]
pub struct ElementsResponse {
    pub success: bool,
    pub count: usize,
    pub elements: Vec<UIElementInfo>,
}

pub async fn elements(
    State(state): State<AppState>,
    Query(params): Query<ElementsQueryParams>,
) -> ApiResult<Json<ElementsResponse>> {
    let query = ElementQuery {
        role: params.role,
        title: params.title,
        title_contains: params.title_contains,
        label_contains: params.label_contains,
        value_contains: params.value_contains,
    };
    if !query.has_predicates() {
        return Err(ApiError::Validation(
            "At least one search criteria is required (role, title, titleContains, \
             labelContains, valueContains)"
                .to_string(),
        ));
    }
    let max_results = params.max_results.unwrap_or(DEFAULT_MAX_RESULTS).max(1);
    let pid = resolve_pid(&state, params.pid).await?;

    let infos = state
        .platform
        .call(move |p| {
            let root = p.app_element(pid)?;
            Ok(element::query_all(root, &query, max_results)
                .into_iter()
                .map(|(indices, node)| {
                    element::element_info(node.as_ref(), ElementPath::new(pid, indices), 0)
                })
                .collect::<Vec<_>>())
        })
        .await?;
    Ok(Json(ElementsResponse {
        success: true,
        count: infos.len(),
        elements: infos,
    }))
}

#[derive(Deserialize)]
pub struct FocusedQuery {
    pub pid: Option<i32>,
}

pub async fn focused(
    State(state): State<AppState>,
    Query(params): Query<FocusedQuery>,
) -> ApiResult<Json<ElementResponse>> {
    let pid = resolve_pid(&state, params.pid).await?;
    let info = state
        .platform
        .call(move |p| {
            let root = p.app_element(pid)?;
            let (indices, node) = element::find_focused(root).ok_or_else(|| {
                marionette::AutomationError::ElementNotFound(format!(
                    "No focused element in application {pid}"
                ))
            })?;
            Ok(element::element_info(
                node.as_ref(),
                ElementPath::new(pid, indices),
                0,
            ))
        })
        .await?;
    Ok(Json(ElementResponse {
        success: true,
        element: info,
    }))
}

#[derive(Deserialize)]
pub struct ActionRequest {
    pub path: ElementPath,
    pub action: ActionKind,
    pub value: Option<String>,
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub action: ActionKind,
    pub element: UIElementInfo,
}

pub async fn action(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ActionRequest>,
) -> ApiResult<Json<ActionResponse>> {
    let value = match (req.action, &req.value) {
        (ActionKind::SetValue, Some(v)) if !v.is_empty() => Some(v.clone()),
        (ActionKind::SetValue, _) => {
            return Err(ApiError::Validation(
                "'value' is required and must be non-empty for setValue".to_string(),
            ));
        }
        (_, Some(_)) => {
            return Err(ApiError::Validation(format!(
                "'value' is only accepted for setValue, not {:?}",
                req.action
            )));
        }
        (_, None) => None,
    };

    let kind = req.action;
    let path = req.path;
    let info = state
        .platform
        .call(move |p| {
            let root = p.app_element(path.pid)?;
            let node = element::navigate(root, &path.path)?;
            match kind {
                ActionKind::SetValue => node.set_value(value.as_deref().unwrap_or_default())?,
                ActionKind::Focus => node.focus()?,
                other => {
                    let name = other.ax_action().ok_or_else(|| {
                        marionette::AutomationError::UnsupportedOperation(format!(
                            "{other:?} is not a named accessibility action"
                        ))
                    })?;
                    node.perform(name)?;
                }
            }
            Ok(element::element_info(node.as_ref(), path, 0))
        })
        .await?;
    Ok(Json(ActionResponse {
        success: true,
        action: kind,
        element: info,
    }))
}
