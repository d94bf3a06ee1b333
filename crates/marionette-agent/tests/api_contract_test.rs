//! Contract-level invariants: validation shapes, envelopes, middleware.

mod common;

use common::*;
use marionette::platforms::fake::RecordedEvent;
use serde_json::json;

#[tokio::test]
async fn health_shape() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let state = fake_state();
    let router = router(&state);
    let (status, _, _) = get_raw(&router, "/nope").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn negative_click_coordinates_are_rejected_without_synthesis() {
    let state = fake_state();
    let router = router(&state);

    for body in [
        json!({ "x": -1.0, "y": 10.0 }),
        json!({ "x": 10.0, "y": -0.5 }),
    ] {
        let (status, response) = post_json(&router, "/click", body).await;
        assert_eq!(status, 400);
        assert_eq!(response["code"], 400);
        assert!(response["error"].is_string());
    }
    assert!(state.events().is_empty());
}

#[tokio::test]
async fn click_synthesizes_with_count_and_modifiers() {
    let state = fake_state();
    let router = router(&state);

    let (status, body) = post_json(
        &router,
        "/click",
        json!({ "x": 50.0, "y": 60.0, "button": "right", "click_count": 2, "modifiers": ["shift"] }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    match &state.events()[..] {
        [RecordedEvent::MouseClick {
            x,
            y,
            click_count,
            flags,
            ..
        }] => {
            assert_eq!((*x, *y), (50.0, 60.0));
            assert_eq!(*click_count, 2);
            assert!(flags.shift);
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[tokio::test]
async fn unknown_modifier_is_rejected() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(
        &router,
        "/click",
        json!({ "x": 1.0, "y": 1.0, "modifiers": ["hyper"] }),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("hyper"));
}

#[tokio::test]
async fn empty_type_text_is_rejected() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(&router, "/type", json!({ "text": "" })).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn unknown_type_mode_names_both_valid_modes() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(
        &router,
        "/type",
        json!({ "text": "x", "mode": "insert" }),
    )
    .await;
    assert_eq!(status, 400);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("replace"));
    assert!(error.contains("keys"));
}

#[tokio::test]
async fn global_replace_type_falls_through_to_keystrokes() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(&router, "/type", json!({ "text": "Hi!" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["method"], "keystrokes");
    assert_eq!(body["characters_typed"], 3);

    let downs: Vec<_> = state
        .events()
        .into_iter()
        .filter(|e| matches!(e, RecordedEvent::KeyGlobal { down: true, .. }))
        .collect();
    assert_eq!(downs.len(), 3);
    // 'H' and '!' need shift on the US layout.
    match (&downs[0], &downs[2]) {
        (
            RecordedEvent::KeyGlobal { flags: h, .. },
            RecordedEvent::KeyGlobal { flags: bang, .. },
        ) => {
            assert!(h.shift);
            assert!(bang.shift);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn non_ascii_typing_uses_unicode_fallback() {
    let state = fake_state();
    let router = router(&state);
    let (status, _body) = post_json(&router, "/type", json!({ "text": "é" })).await;
    assert_eq!(status, 200);
    assert!(state.events().iter().any(|e| matches!(
        e,
        RecordedEvent::KeyGlobal { unicode: Some(u), .. } if u == "é"
    )));
}

#[tokio::test]
async fn zero_scroll_deltas_are_rejected() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(
        &router,
        "/scroll",
        json!({ "delta_x": 0, "delta_y": 0, "x": 10, "y": 10 }),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("non-zero"));
    assert!(state.events().is_empty());
}

#[tokio::test]
async fn scroll_requires_coordinates_without_path() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(&router, "/scroll", json!({ "delta_y": -5 })).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("x"));
}

#[tokio::test]
async fn scroll_with_path_targets_element_center_and_pid() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(
        &router,
        "/scroll",
        json!({ "delta_y": -10, "path": { "pid": APP_PID, "path": [0, 0] } }),
    )
    .await;
    assert_eq!(status, 200);
    // OK button frame center.
    assert_eq!(body["x"], 140.0);
    assert_eq!(body["y"], 220.0);
    assert!(state.events().iter().any(|e| matches!(
        e,
        RecordedEvent::ScrollToPid { pid, x, y, delta_y, .. }
            if *pid == APP_PID && *x == 140.0 && *y == 220.0 && *delta_y == -10.0
    )));
}

#[tokio::test]
async fn wait_timeout_out_of_range_is_rejected() {
    let state = fake_state();
    let router = router(&state);
    for timeout in [0u64, 60_001] {
        let (status, body) = post_json(
            &router,
            "/wait",
            json!({ "title": "X", "timeout_ms": timeout }),
        )
        .await;
        assert_eq!(status, 400, "timeout {timeout}");
        assert_eq!(body["code"], 400);
    }
}

#[tokio::test]
async fn wait_poll_interval_out_of_range_is_rejected() {
    let state = fake_state();
    let router = router(&state);
    let (status, _) = post_json(
        &router,
        "/wait",
        json!({ "title": "X", "poll_interval_ms": 5001 }),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn elements_query_without_predicates_mentions_criteria() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(&router, "/accessibility/elements").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("criteria"));
}

#[tokio::test]
async fn malformed_json_gets_validation_shape() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_raw_body(&router, "/click", "{not json").await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], 400);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let state = fake_state();
    let router = router(&state);
    let big = "x".repeat(20 * 1024);
    let (status, _body) = post_raw_body(
        &router,
        "/click",
        &format!("{{\"x\":1,\"y\":1,\"pad\":\"{big}\"}}"),
    )
    .await;
    assert_eq!(status, 413);
}

#[tokio::test]
async fn type_accepts_bodies_beyond_the_default_cap() {
    let state = fake_state();
    let router = router(&state);
    // ~20 KiB of text: over the 10 KiB default cap, well under /type's.
    let text = "a".repeat(20 * 1024);
    let (status, body) = post_json(
        &router,
        "/type",
        json!({ "text": text, "pid": APP_PID, "title_contains": "Email" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["characters_typed"], 20 * 1024);
}

#[tokio::test]
async fn success_field_is_always_boolean() {
    let state = fake_state();
    let router = router(&state);
    let responses = [
        post_json(&router, "/click", json!({ "x": 1, "y": 1 })).await,
        post_json(&router, "/click/element", json!({ "title": "OK" })).await,
        post_json(&router, "/type", json!({ "text": "x" })).await,
        post_json(&router, "/key", json!({ "key": "return" })).await,
        post_json(
            &router,
            "/scroll",
            json!({ "delta_y": 3, "x": 1, "y": 1 }),
        )
        .await,
        post_json(&router, "/wait", json!({ "title": "X", "timeout_ms": 50 })).await,
        get(&router, "/status").await,
        get(&router, "/apps").await,
        get(&router, "/windows").await,
        get(&router, "/accessibility/tree").await,
        post_json(&router, "/quit", json!({})).await,
    ];
    for (_, body) in responses {
        assert!(
            body["success"].is_boolean(),
            "missing boolean success in {body}"
        );
    }
}

#[tokio::test]
async fn resolution_failure_is_400_with_success_false() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(
        &router,
        "/click/element",
        json!({ "title": "DoesNotExist" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("DoesNotExist"));
}

#[tokio::test]
async fn adapter_failure_is_500_with_success_false() {
    let state = fake_state();
    let router = router(&state);
    // The Email field declares no AXPress action, so an accessibility-mode
    // click fails at the adapter.
    let (status, body) = post_json(
        &router,
        "/click/element",
        json!({ "title_contains": "Email", "use_accessibility_action": true }),
    )
    .await;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("AXError"));
}

#[tokio::test]
async fn click_element_requires_a_predicate() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = post_json(&router, "/click/element", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], 400);
}
