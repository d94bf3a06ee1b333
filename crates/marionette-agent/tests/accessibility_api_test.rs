//! `/accessibility/*` and `/menu` behavior.

mod common;

use common::*;
use marionette::platforms::fake::{FakeNodeSpec, FakeState, RecordedEvent};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn tree_defaults_to_nested_format() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(&router, "/accessibility/tree").await;
    assert_eq!(status, 200);
    assert_eq!(body["format"], "tree");
    assert_eq!(body["pid"], APP_PID);
    assert_eq!(body["tree"]["role"], "AXApplication");
    let window = &body["tree"]["children"][0];
    assert_eq!(window["role"], "AXWindow");
    assert_eq!(window["children"][0]["title"], "OK");
}

#[tokio::test]
async fn tree_root_path_agrees_with_full_tree_subtree() {
    let state = fake_state();
    let router = router(&state);

    let (_, full) = get(&router, "/accessibility/tree?format=tree").await;
    let subtree_in_full = full["tree"]["children"][0].clone();

    let (status, scoped) = get(&router, "/accessibility/tree?format=tree&rootPath=0").await;
    assert_eq!(status, 200);
    assert_eq!(scoped["tree"], subtree_in_full);
}

#[tokio::test]
async fn tree_depth_is_capped() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(&router, "/accessibility/tree?maxDepth=99").await;
    assert_eq!(status, 200);
    // Cap is 10: the fixture is shallow, so just confirm it still serialized.
    assert!(body["tree"].is_object());
}

#[tokio::test]
async fn compact_format_flattens_and_skips_actions_by_default() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(&router, "/accessibility/tree?format=compact").await;
    assert_eq!(status, 200);
    assert_eq!(body["format"], "compact");
    let elements = body["elements"].as_array().unwrap();
    assert_eq!(body["count"], elements.len());
    assert!(elements.iter().all(|e| e.get("actions").is_none()));
    // Depth-first with carried depth.
    let window = elements.iter().find(|e| e["role"] == "AXWindow").unwrap();
    let button = elements.iter().find(|e| e["title"] == "OK").unwrap();
    assert_eq!(window["depth"], 1);
    assert_eq!(button["depth"], 2);
}

#[tokio::test]
async fn compact_include_actions_lists_node_actions() {
    let state = fake_state();
    let router = router(&state);
    let (_, body) = get(
        &router,
        "/accessibility/tree?format=compact&includeActions=true",
    )
    .await;
    let elements = body["elements"].as_array().unwrap();
    let button = elements.iter().find(|e| e["title"] == "OK").unwrap();
    assert_eq!(button["actions"], json!(["AXPress"]));
}

#[tokio::test]
async fn element_lookup_with_child_depth() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(
        &router,
        &format!("/accessibility/element?pid={APP_PID}&path=0&childDepth=1"),
    )
    .await;
    assert_eq!(status, 200);
    let element = &body["element"];
    assert_eq!(element["role"], "AXWindow");
    assert_eq!(element["path"]["path"], json!([0]));
    assert_eq!(element["children"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn element_lookup_requires_pid_and_path() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(&router, "/accessibility/element?path=0").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("pid"));

    let (status, _) = get(&router, &format!("/accessibility/element?pid={APP_PID}")).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn stale_path_fails_cleanly() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(
        &router,
        &format!("/accessibility/element?pid={APP_PID}&path=0,17"),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("out of range"));
}

#[tokio::test]
async fn elements_query_filters_and_counts() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(&router, "/accessibility/elements?role=AXButton").await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 2);

    let (_, body) = get(
        &router,
        "/accessibility/elements?role=AXButton&maxResults=1",
    )
    .await;
    assert_eq!(body["count"], 1);

    let (_, body) = get(
        &router,
        "/accessibility/elements?titleContains=ok&role=AXButton",
    )
    .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["elements"][0]["title"], "OK");
}

#[tokio::test]
async fn focused_element_reports_its_path() {
    let tree = FakeNodeSpec::app(APP_NAME).children(vec![FakeNodeSpec::window("Main")
        .children(vec![
            FakeNodeSpec::button("OK"),
            FakeNodeSpec::text_field("Search").focused(true),
        ])]);
    let state = Arc::new(FakeState::with_tree(APP_PID, APP_NAME, tree));
    let router = router(&state);

    let (status, body) = get(&router, "/accessibility/focused").await;
    assert_eq!(status, 200);
    assert_eq!(body["element"]["title"], "Search");
    assert_eq!(body["element"]["path"]["path"], json!([0, 1]));
    assert_eq!(body["element"]["is_focused"], true);
}

#[tokio::test]
async fn focused_without_focus_is_a_resolution_failure() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(&router, "/accessibility/focused").await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn action_set_value_requires_value() {
    let state = fake_state();
    let router = router(&state);

    let (status, body) = post_json(
        &router,
        "/accessibility/action",
        json!({ "path": { "pid": APP_PID, "path": [0, 2] }, "action": "setValue" }),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("value"));

    let (status, _) = post_json(
        &router,
        "/accessibility/action",
        json!({
            "path": { "pid": APP_PID, "path": [0, 2] },
            "action": "setValue",
            "value": "hello",
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert!(state.events().iter().any(|e| matches!(
        e,
        RecordedEvent::SetValue { value, .. } if value == "hello"
    )));
}

#[tokio::test]
async fn action_rejects_value_for_press() {
    let state = fake_state();
    let router = router(&state);
    let (status, _) = post_json(
        &router,
        "/accessibility/action",
        json!({
            "path": { "pid": APP_PID, "path": [0, 0] },
            "action": "press",
            "value": "nope",
        }),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn action_press_dispatches_to_adapter() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(
        &router,
        "/accessibility/action",
        json!({ "path": { "pid": APP_PID, "path": [0, 0] }, "action": "press" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["element"]["title"], "OK");
    assert!(state.events().iter().any(|e| matches!(
        e,
        RecordedEvent::Action { action, .. } if action == "AXPress"
    )));
}

#[tokio::test]
async fn unknown_action_kind_is_rejected() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(
        &router,
        "/accessibility/action",
        json!({ "path": { "pid": APP_PID, "path": [0, 0] }, "action": "explode" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], 400);
}

fn menu_fixture(state: &Arc<FakeState>) {
    state.set_menu(FakeNodeSpec::new("AXMenuBar").children(vec![
        FakeNodeSpec::menu_bar_item(
            "File",
            vec![
                FakeNodeSpec::menu_item("New Window").shortcut("⌘N"),
                FakeNodeSpec::menu_bar_item(
                    "Export",
                    vec![FakeNodeSpec::menu_item("Export as PDF…")],
                ),
                FakeNodeSpec::menu_item("Close").shortcut("⌘W").enabled(false),
            ],
        ),
        FakeNodeSpec::menu_bar_item("Edit", vec![FakeNodeSpec::menu_item("Copy").shortcut("⌘C")]),
    ]));
}

#[tokio::test]
async fn menu_tree_reports_shortcuts_and_submenus() {
    let state = fake_state();
    menu_fixture(&state);
    let router = router(&state);

    let (status, body) = get(&router, "/menu").await;
    assert_eq!(status, 200);
    let menus = body["menus"].as_array().unwrap();
    assert_eq!(menus.len(), 2);
    let file = &menus[0];
    assert_eq!(file["title"], "File");
    assert_eq!(file["has_submenu"], true);
    let new_window = &file["children"][0];
    assert_eq!(new_window["shortcut"], "⌘N");
    let close = &file["children"][2];
    assert_eq!(close["is_enabled"], false);
}

#[tokio::test]
async fn menu_trigger_walks_substring_matches() {
    let state = fake_state();
    menu_fixture(&state);
    let router = router(&state);

    let (status, body) = post_json(
        &router,
        "/menu",
        json!({ "path": ["file", "export", "pdf"] }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["triggered"], "Export as PDF…");

    let events = state.events();
    // Foreground mode activates the app before pressing.
    assert!(events
        .iter()
        .any(|e| matches!(e, RecordedEvent::Activate { pid } if *pid == APP_PID)));
    assert!(events.iter().any(|e| matches!(
        e,
        RecordedEvent::Action { action, title: Some(t), .. }
            if action == "AXPress" && t == "Export as PDF…"
    )));
}

#[tokio::test]
async fn menu_trigger_background_skips_activation() {
    let state = fake_state();
    menu_fixture(&state);
    let router = router(&state);

    let (status, _) = post_json(
        &router,
        "/menu",
        json!({ "path": ["Edit", "Copy"], "background": true }),
    )
    .await;
    assert_eq!(status, 200);
    assert!(!state
        .events()
        .iter()
        .any(|e| matches!(e, RecordedEvent::Activate { .. })));
}

#[tokio::test]
async fn menu_trigger_unresolved_path_is_reported() {
    let state = fake_state();
    menu_fixture(&state);
    let router = router(&state);

    let (status, body) = post_json(&router, "/menu", json!({ "path": ["File", "Print"] })).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Print"));
}

#[tokio::test]
async fn tree_for_unknown_pid_fails_cleanly() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(&router, "/accessibility/tree?pid=99999").await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn wire_field_names_are_lower_snake_case() {
    let state = fake_state();
    let router = router(&state);
    let (_, body) = get(
        &router,
        &format!("/accessibility/element?pid={APP_PID}&path=0,0"),
    )
    .await;
    let element = body["element"].as_object().unwrap();
    assert!(element.contains_key("is_enabled"));
    assert!(element.contains_key("is_focused"));
    assert!(element
        .keys()
        .all(|k| k.chars().all(|c| c.is_ascii_lowercase() || c == '_')));
}
