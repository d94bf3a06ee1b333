//! `/status`, `/apps`, `/windows`, `/screenshot`.

mod common;

use common::*;
use marionette::types::{ElementFrame, WindowInfo};

fn add_windows(state: &std::sync::Arc<marionette::platforms::fake::FakeState>) {
    state.add_window(WindowInfo {
        window_id: 11,
        title: Some("Main".into()),
        app_name: APP_NAME.into(),
        bundle_id: None,
        pid: APP_PID,
        frame: ElementFrame {
            x: 0.0,
            y: 0.0,
            width: 640.0,
            height: 480.0,
        },
        is_on_screen: false,
    });
    state.add_window(WindowInfo {
        window_id: 12,
        title: Some("Main — visible".into()),
        app_name: APP_NAME.into(),
        bundle_id: None,
        pid: APP_PID,
        frame: ElementFrame {
            x: 0.0,
            y: 0.0,
            width: 320.0,
            height: 240.0,
        },
        is_on_screen: true,
    });
    state.add_window(WindowInfo {
        window_id: 20,
        title: Some("Other".into()),
        app_name: "OtherApp".into(),
        bundle_id: None,
        pid: 999,
        frame: ElementFrame {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        },
        is_on_screen: true,
    });
}

#[tokio::test]
async fn status_reports_target_and_permissions() {
    let state = fake_state();
    let router = router(&state);

    let (status, body) = get(&router, "/status").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["server_running"], true);
    assert_eq!(body["permissions"]["accessibility"], true);
    assert_eq!(body["permissions"]["screen_recording"], true);
    assert_eq!(body["screen_size"]["width"], 1440.0);
    assert_eq!(body["target_app"]["processIdentifier"], APP_PID);
    assert_eq!(body["target_app"]["name"], APP_NAME);
    assert_eq!(body["frontmost_app"]["pid"], APP_PID);
}

#[tokio::test]
async fn status_is_repeatable() {
    let state = fake_state();
    let router = router(&state);

    let (_, first) = get(&router, "/status").await;
    let (_, second) = get(&router, "/status").await;
    assert_eq!(first["permissions"], second["permissions"]);
    assert_eq!(first["screen_size"], second["screen_size"]);
}

#[tokio::test]
async fn status_reflects_missing_permissions() {
    let state = fake_state();
    state.set_permissions(false, true);
    let router = router(&state);
    let (_, body) = get(&router, "/status").await;
    assert_eq!(body["permissions"]["accessibility"], false);
    assert_eq!(body["permissions"]["screen_recording"], true);
}

#[tokio::test]
async fn apps_lists_running_applications() {
    let state = fake_state();
    let router = router(&state);
    let (status, body) = get(&router, "/apps").await;
    assert_eq!(status, 200);
    let apps = body["apps"].as_array().unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0]["pid"], APP_PID);
    assert_eq!(apps[0]["name"], APP_NAME);
}

#[tokio::test]
async fn windows_filters_offscreen_unless_asked() {
    let state = fake_state();
    add_windows(&state);
    let router = router(&state);

    let (_, body) = get(&router, "/windows").await;
    assert_eq!(body["windows"].as_array().unwrap().len(), 2);

    let (_, body) = get(&router, "/windows?all=true").await;
    assert_eq!(body["windows"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn screenshot_png_returns_image_bytes() {
    let state = fake_state();
    let router = router_unscoped(&state);

    let (status, headers, bytes) = get_raw(&router, "/screenshot").await;
    assert_eq!(status, 200);
    assert_eq!(headers["content-type"], "image/png");
    // PNG magic
    assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 1440);
    assert_eq!(decoded.height(), 900);
}

#[tokio::test]
async fn screenshot_jpeg_content_type() {
    let state = fake_state();
    let router = router_unscoped(&state);
    let (status, headers, bytes) = get_raw(&router, "/screenshot?format=jpeg").await;
    assert_eq!(status, 200);
    assert_eq!(headers["content-type"], "image/jpeg");
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn screenshot_invalid_format_is_rejected() {
    let state = fake_state();
    let router = router(&state);
    let (status, _, _) = get_raw(&router, "/screenshot?format=bmp").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn screenshot_app_prefers_on_screen_window() {
    let state = fake_state();
    add_windows(&state);
    let router = router_unscoped(&state);

    let (status, body) = get(&router, "/screenshot?format=base64&app=testapp").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["format"], "base64");
    // The on-screen window (id 12, 320x240) wins over the off-screen one.
    assert_eq!(body["window"]["id"], 12);
    assert_eq!(body["width"], 320);
    assert_eq!(body["height"], 240);
    assert!(!body["data"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn screenshot_bound_target_stands_in_for_app() {
    let state = fake_state();
    add_windows(&state);
    // Scoped router: the target app is TestApp.
    let router = router(&state);

    let (status, body) = get(&router, "/screenshot?format=base64").await;
    assert_eq!(status, 200);
    assert_eq!(body["window"]["id"], 12);
    assert_eq!(body["window"]["app"], APP_NAME);
}

#[tokio::test]
async fn screenshot_by_window_id() {
    let state = fake_state();
    add_windows(&state);
    let router = router_unscoped(&state);

    let (status, body) = get(&router, "/screenshot?format=base64&windowId=20").await;
    assert_eq!(status, 200);
    assert_eq!(body["window"]["id"], 20);
    assert_eq!(body["width"], 100);
}

#[tokio::test]
async fn screenshot_unknown_app_fails_resolution() {
    let state = fake_state();
    add_windows(&state);
    let router = router_unscoped(&state);
    let (status, body) = get(&router, "/screenshot?format=base64&app=nowhere").await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn base64_screenshot_round_trips() {
    use base64::Engine as _;
    let state = fake_state();
    let router = router_unscoped(&state);
    let (_, body) = get(&router, "/screenshot?format=base64").await;
    let data = base64::engine::general_purpose::STANDARD
        .decode(body["data"].as_str().unwrap())
        .unwrap();
    let decoded = image::load_from_memory(&data).unwrap();
    assert_eq!(decoded.width(), body["width"].as_u64().unwrap() as u32);
}
