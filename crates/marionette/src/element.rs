//! Element addressing: index-path navigation, queries, and tree snapshots.
//!
//! Navigation is a pure index-chase from the application root. The path is
//! interpreted against the live tree at call time; anything out of range
//! resolves to a clean `ElementNotFound`, never a panic. All functions here
//! run on the executor thread (node handles are not `Send`).

use crate::errors::AutomationError;
use crate::platforms::UiNode;
use crate::types::{CompactElement, ElementPath, ElementQuery, MenuItemInfo, UIElementInfo};

/// Roles worth surfacing in the compact tree format even when the node
/// carries no identifying text: interactive controls, text inputs, and the
/// structural containers a driver scripts against.
pub const MEANINGFUL_ROLES: &[&str] = &[
    "AXButton",
    "AXPopUpButton",
    "AXMenuButton",
    "AXCheckBox",
    "AXRadioButton",
    "AXDisclosureTriangle",
    "AXSegmentedControl",
    "AXSlider",
    "AXIncrementor",
    "AXLink",
    "AXTextField",
    "AXSecureTextField",
    "AXSearchField",
    "AXTextArea",
    "AXComboBox",
    "AXWindow",
    "AXSheet",
    "AXDrawer",
    "AXPopover",
    "AXToolbar",
    "AXTabGroup",
    "AXTable",
    "AXOutline",
    "AXMenuBar",
    "AXMenuBarItem",
    "AXMenu",
    "AXMenuItem",
];

/// Walk `indices` down from `root`, consuming each integer as a child index.
pub fn navigate(
    root: Box<dyn UiNode>,
    indices: &[usize],
) -> Result<Box<dyn UiNode>, AutomationError> {
    let mut current = root;
    for (depth, &idx) in indices.iter().enumerate() {
        let mut children = current.children();
        if idx >= children.len() {
            return Err(AutomationError::ElementNotFound(format!(
                "Path component {} (index {}) is out of range: node has {} children",
                depth,
                idx,
                children.len()
            )));
        }
        current = children.swap_remove(idx);
    }
    Ok(current)
}

/// Snapshot a node into its wire form. `child_depth` levels of children are
/// expanded inline; 0 means leaf-only.
pub fn element_info(node: &dyn UiNode, path: ElementPath, child_depth: usize) -> UIElementInfo {
    let children = if child_depth > 0 {
        let kids = node.children();
        let mut out = Vec::with_capacity(kids.len());
        for (i, kid) in kids.iter().enumerate() {
            let mut kid_path = path.path.clone();
            kid_path.push(i);
            out.push(element_info(
                kid.as_ref(),
                ElementPath::new(path.pid, kid_path),
                child_depth - 1,
            ));
        }
        Some(out)
    } else {
        None
    };

    UIElementInfo {
        role: node.role().unwrap_or_else(|| "AXUnknown".to_string()),
        title: node.title(),
        label: node.label(),
        value: node.value(),
        description: node.description(),
        frame: node.frame(),
        is_enabled: node.is_enabled(),
        is_focused: node.is_focused(),
        actions: node.actions(),
        children,
        path,
    }
}

/// Whether all provided predicates of `query` hold for `node`.
pub fn matches(query: &ElementQuery, node: &dyn UiNode) -> bool {
    let ci_contains = |haystack: Option<String>, needle: &str| {
        haystack
            .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false)
    };

    if let Some(role) = query.role.as_deref().filter(|s| !s.is_empty()) {
        if node.role().as_deref() != Some(role) {
            return false;
        }
    }
    if let Some(title) = query.title.as_deref().filter(|s| !s.is_empty()) {
        if node.title().as_deref() != Some(title) {
            return false;
        }
    }
    if let Some(needle) = query.title_contains.as_deref().filter(|s| !s.is_empty()) {
        if !ci_contains(node.title(), needle) {
            return false;
        }
    }
    if let Some(needle) = query.label_contains.as_deref().filter(|s| !s.is_empty()) {
        if !ci_contains(node.label(), needle) {
            return false;
        }
    }
    if let Some(needle) = query.value_contains.as_deref().filter(|s| !s.is_empty()) {
        if !ci_contains(node.value(), needle) {
            return false;
        }
    }
    true
}

/// Depth-first query over the subtree rooted at `root`. Returns matched
/// nodes with their index paths, stopping once `max_results` are collected.
pub fn query_all(
    root: Box<dyn UiNode>,
    query: &ElementQuery,
    max_results: usize,
) -> Vec<(Vec<usize>, Box<dyn UiNode>)> {
    let mut out = Vec::new();
    walk_query(root, Vec::new(), query, max_results, &mut out);
    out
}

fn walk_query(
    node: Box<dyn UiNode>,
    path: Vec<usize>,
    query: &ElementQuery,
    max_results: usize,
    out: &mut Vec<(Vec<usize>, Box<dyn UiNode>)>,
) {
    if out.len() >= max_results {
        return;
    }
    let children = node.children();
    if matches(query, node.as_ref()) {
        out.push((path.clone(), node));
    }
    for (i, child) in children.into_iter().enumerate() {
        if out.len() >= max_results {
            return;
        }
        let mut child_path = path.clone();
        child_path.push(i);
        walk_query(child, child_path, query, max_results, out);
    }
}

/// First depth-first match for `query`, or a descriptive failure.
pub fn query_first(
    root: Box<dyn UiNode>,
    pid: i32,
    query: &ElementQuery,
) -> Result<(ElementPath, Box<dyn UiNode>), AutomationError> {
    query_all(root, query, 1)
        .into_iter()
        .next()
        .map(|(indices, node)| (ElementPath::new(pid, indices), node))
        .ok_or_else(|| {
            AutomationError::ElementNotFound(format!("No element matching {query}"))
        })
}

/// Depth-first flattening for the compact tree format: only nodes that carry
/// identifying text or belong to the meaningful-role set are emitted.
pub fn collect_compact(
    node: &dyn UiNode,
    pid: i32,
    base_path: &[usize],
    depth: usize,
    max_depth: usize,
    include_actions: bool,
    out: &mut Vec<CompactElement>,
) {
    if depth > max_depth {
        return;
    }

    let role = node.role().unwrap_or_else(|| "AXUnknown".to_string());
    let title = node.title().filter(|t| !t.is_empty());
    let label = node.label().filter(|l| !l.is_empty());
    let identifying = title.is_some() || label.is_some();
    if identifying || MEANINGFUL_ROLES.contains(&role.as_str()) {
        out.push(CompactElement {
            depth,
            path: ElementPath::new(pid, base_path.to_vec()),
            role,
            title,
            label,
            value: node.value().filter(|v| !v.is_empty()),
            frame: node.frame(),
            actions: if include_actions {
                Some(node.actions())
            } else {
                None
            },
        });
    }

    for (i, child) in node.children().iter().enumerate() {
        let mut child_path = base_path.to_vec();
        child_path.push(i);
        collect_compact(
            child.as_ref(),
            pid,
            &child_path,
            depth + 1,
            max_depth,
            include_actions,
            out,
        );
    }
}

/// Locate the focused node by traversal, returning it with its index path.
pub fn find_focused(root: Box<dyn UiNode>) -> Option<(Vec<usize>, Box<dyn UiNode>)> {
    let children = root.children();
    if root.is_focused() {
        return Some((Vec::new(), root));
    }
    for (i, child) in children.into_iter().enumerate() {
        if let Some((mut path, node)) = find_focused(child) {
            path.insert(0, i);
            return Some((path, node));
        }
    }
    None
}

/// Snapshot a menu subtree. `AXMenuBarItem`/`AXMenuItem` nodes wrap their
/// submenu in an intermediate `AXMenu` child, which is flattened away here.
pub fn menu_tree(node: &dyn UiNode, depth: usize, max_depth: usize) -> Vec<MenuItemInfo> {
    if depth >= max_depth {
        return Vec::new();
    }
    submenu_children(node)
        .iter()
        .filter_map(|item| {
            let title = item.title().filter(|t| !t.is_empty())?;
            let kids = submenu_children(item.as_ref());
            Some(MenuItemInfo {
                title,
                is_enabled: item.is_enabled(),
                has_submenu: !kids.is_empty(),
                shortcut: item.shortcut(),
                children: menu_tree(item.as_ref(), depth + 1, max_depth),
            })
        })
        .collect()
}

/// The scriptable children of a menu node: the contents of the wrapping
/// `AXMenu`, or the direct children when there is no wrapper.
pub fn submenu_children(node: &dyn UiNode) -> Vec<Box<dyn UiNode>> {
    let children = node.children();
    if children.len() == 1 && children[0].role().as_deref() == Some("AXMenu") {
        return children[0].children();
    }
    children
}

/// Resolve an ordered list of titles down the menu tree. Matching is a
/// case-insensitive substring test at each level; the first depth-first
/// match wins at every step.
pub fn resolve_menu_path(
    bar: Box<dyn UiNode>,
    titles: &[String],
) -> Result<Box<dyn UiNode>, AutomationError> {
    let mut current = bar;
    for (level, wanted) in titles.iter().enumerate() {
        let needle = wanted.to_lowercase();
        let candidates = submenu_children(current.as_ref());
        let found = candidates.into_iter().find(|item| {
            item.title()
                .map(|t| t.to_lowercase().contains(&needle))
                .unwrap_or(false)
        });
        current = found.ok_or_else(|| {
            AutomationError::ElementNotFound(format!(
                "Menu item '{wanted}' not found at level {level}"
            ))
        })?;
    }
    Ok(current)
}
