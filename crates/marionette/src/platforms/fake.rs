//! In-memory platform used by the test suites.
//!
//! Backs the whole adapter surface with a hand-built accessibility tree and
//! records every synthesized event, invoked action, and attribute write so
//! tests can assert on exactly what reached the "OS". The tree is an
//! immutable snapshot; tests that need the UI to change over time swap the
//! whole tree with [`FakeState::set_tree`].

use crate::errors::AutomationError;
use crate::platforms::{AppSpec, PermissionPane, Platform, UiNode};
use crate::screenshot::CaptureResult;
use crate::types::{
    AppInfo, DisplayInfo, ElementFrame, ModifierFlags, MouseButton, WindowInfo,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Everything recorded by the fake adapters.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    KeyGlobal {
        keycode: u16,
        down: bool,
        flags: ModifierFlags,
        unicode: Option<String>,
    },
    KeyToPid {
        pid: i32,
        keycode: u16,
        down: bool,
        flags: ModifierFlags,
        unicode: Option<String>,
    },
    MouseClick {
        x: f64,
        y: f64,
        button: MouseButton,
        click_count: u32,
        flags: ModifierFlags,
    },
    ScrollGlobal {
        x: f64,
        y: f64,
        delta_x: f64,
        delta_y: f64,
    },
    ScrollToPid {
        pid: i32,
        x: f64,
        y: f64,
        delta_x: f64,
        delta_y: f64,
    },
    Action {
        node_id: usize,
        title: Option<String>,
        action: String,
    },
    SetValue {
        node_id: usize,
        title: Option<String>,
        value: String,
    },
    Focus {
        node_id: usize,
        title: Option<String>,
    },
    Activate {
        pid: i32,
    },
    Launch {
        spec: String,
    },
    OpenSettings {
        pane: &'static str,
    },
}

struct Node {
    id: usize,
    role: String,
    title: Option<String>,
    label: Option<String>,
    value: Option<String>,
    description: Option<String>,
    frame: Option<ElementFrame>,
    enabled: bool,
    focused: bool,
    actions: Vec<String>,
    shortcut: Option<String>,
    children: Vec<Arc<Node>>,
}

/// Declarative builder for one fake tree node.
#[derive(Clone)]
pub struct FakeNodeSpec {
    role: String,
    title: Option<String>,
    label: Option<String>,
    value: Option<String>,
    description: Option<String>,
    frame: Option<ElementFrame>,
    enabled: bool,
    focused: bool,
    actions: Vec<String>,
    shortcut: Option<String>,
    children: Vec<FakeNodeSpec>,
}

impl FakeNodeSpec {
    pub fn new(role: &str) -> Self {
        Self {
            role: role.to_string(),
            title: None,
            label: None,
            value: None,
            description: None,
            frame: None,
            enabled: true,
            focused: false,
            actions: Vec::new(),
            shortcut: None,
            children: Vec::new(),
        }
    }

    pub fn app(name: &str) -> Self {
        Self::new("AXApplication").title(name)
    }

    pub fn window(title: &str) -> Self {
        Self::new("AXWindow").title(title)
    }

    pub fn button(title: &str) -> Self {
        Self::new("AXButton").title(title).actions(&["AXPress"])
    }

    pub fn text_field(title: &str) -> Self {
        Self::new("AXTextField").title(title)
    }

    pub fn static_text(value: &str) -> Self {
        Self::new("AXStaticText").value(value)
    }

    pub fn menu_bar_item(title: &str, items: Vec<FakeNodeSpec>) -> Self {
        Self::new("AXMenuBarItem")
            .title(title)
            .actions(&["AXPress"])
            .children(vec![Self::new("AXMenu").children(items)])
    }

    pub fn menu_item(title: &str) -> Self {
        Self::new("AXMenuItem").title(title).actions(&["AXPress"])
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn frame(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.frame = Some(ElementFrame {
            x,
            y,
            width,
            height,
        });
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn actions(mut self, actions: &[&str]) -> Self {
        self.actions = actions.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn shortcut(mut self, shortcut: &str) -> Self {
        self.shortcut = Some(shortcut.to_string());
        self
    }

    pub fn children(mut self, children: Vec<FakeNodeSpec>) -> Self {
        self.children = children;
        self
    }

    fn build(self, counter: &AtomicUsize) -> Arc<Node> {
        let id = counter.fetch_add(1, Ordering::Relaxed);
        let children = self
            .children
            .into_iter()
            .map(|c| c.build(counter))
            .collect();
        Arc::new(Node {
            id,
            role: self.role,
            title: self.title,
            label: self.label,
            value: self.value,
            description: self.description,
            frame: self.frame,
            enabled: self.enabled,
            focused: self.focused,
            actions: self.actions,
            shortcut: self.shortcut,
            children,
        })
    }
}

/// Shared fake-world state. Tests keep a clone of the `Arc` and inspect or
/// mutate it while the executor-side [`FakePlatform`] serves requests.
pub struct FakeState {
    app: AppInfo,
    tree: Mutex<Arc<Node>>,
    menu: Mutex<Option<Arc<Node>>>,
    apps: Mutex<Vec<AppInfo>>,
    running: Mutex<HashSet<i32>>,
    windows: Mutex<Vec<WindowInfo>>,
    displays: Mutex<Vec<DisplayInfo>>,
    accessibility: Mutex<bool>,
    screen_recording: Mutex<bool>,
    events: Mutex<Vec<RecordedEvent>>,
    /// App registered when `launch` is called, for launch-flow tests.
    pending_launch: Mutex<Option<AppInfo>>,
    node_counter: AtomicUsize,
}

impl FakeState {
    pub fn with_tree(pid: i32, name: &str, root: FakeNodeSpec) -> Self {
        let counter = AtomicUsize::new(0);
        let tree = root.build(&counter);
        let app = AppInfo {
            pid,
            name: name.to_string(),
            bundle_id: Some(format!("com.example.{}", name.to_lowercase())),
            is_frontmost: true,
        };
        Self {
            tree: Mutex::new(tree),
            menu: Mutex::new(None),
            apps: Mutex::new(vec![app.clone()]),
            running: Mutex::new(HashSet::from([pid])),
            windows: Mutex::new(Vec::new()),
            displays: Mutex::new(vec![DisplayInfo {
                display_id: 1,
                width: 1440.0,
                height: 900.0,
                is_main: true,
            }]),
            accessibility: Mutex::new(true),
            screen_recording: Mutex::new(true),
            events: Mutex::new(Vec::new()),
            pending_launch: Mutex::new(None),
            node_counter: counter,
            app,
        }
    }

    pub fn default_app(pid: i32, name: &str) -> Self {
        Self::with_tree(pid, name, FakeNodeSpec::app(name))
    }

    pub fn app_info(&self) -> AppInfo {
        self.app.clone()
    }

    /// Replace the whole accessibility tree. Node ids keep counting up, so
    /// recordings from before and after a swap stay distinguishable.
    pub fn set_tree(&self, root: FakeNodeSpec) {
        *self.tree.lock().unwrap() = root.build(&self.node_counter);
    }

    pub fn set_menu(&self, bar: FakeNodeSpec) {
        *self.menu.lock().unwrap() = Some(bar.build(&self.node_counter));
    }

    pub fn add_app(&self, app: AppInfo) {
        self.running.lock().unwrap().insert(app.pid);
        self.apps.lock().unwrap().push(app);
    }

    pub fn add_window(&self, window: WindowInfo) {
        self.windows.lock().unwrap().push(window);
    }

    pub fn set_permissions(&self, accessibility: bool, screen_recording: bool) {
        *self.accessibility.lock().unwrap() = accessibility;
        *self.screen_recording.lock().unwrap() = screen_recording;
    }

    /// Simulate the target process exiting.
    pub fn kill(&self, pid: i32) {
        self.running.lock().unwrap().remove(&pid);
        self.apps.lock().unwrap().retain(|a| a.pid != pid);
    }

    /// Arrange for the next `launch` call to bring this app up.
    pub fn set_pending_launch(&self, app: AppInfo) {
        *self.pending_launch.lock().unwrap() = Some(app);
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    /// The node id at an index path, for asserting on recorded actions.
    pub fn node_id_at(&self, path: &[usize]) -> Option<usize> {
        let mut current = self.tree.lock().unwrap().clone();
        for &idx in path {
            let next = current.children.get(idx)?.clone();
            current = next;
        }
        Some(current.id)
    }

    fn record(&self, event: RecordedEvent) {
        self.events.lock().unwrap().push(event);
    }

    /// Root as a `UiNode`, for driving the addressing code directly in unit
    /// tests (the agent goes through [`FakePlatform`] instead).
    pub fn root_node(self: &Arc<Self>) -> Box<dyn UiNode> {
        let node = self.tree.lock().unwrap().clone();
        Box::new(FakeNode {
            node,
            state: self.clone(),
        })
    }
}

struct FakeNode {
    node: Arc<Node>,
    state: Arc<FakeState>,
}

impl UiNode for FakeNode {
    fn role(&self) -> Option<String> {
        Some(self.node.role.clone())
    }

    fn title(&self) -> Option<String> {
        self.node.title.clone()
    }

    fn label(&self) -> Option<String> {
        self.node.label.clone()
    }

    fn value(&self) -> Option<String> {
        self.node.value.clone()
    }

    fn description(&self) -> Option<String> {
        self.node.description.clone()
    }

    fn frame(&self) -> Option<ElementFrame> {
        self.node.frame
    }

    fn is_enabled(&self) -> bool {
        self.node.enabled
    }

    fn is_focused(&self) -> bool {
        self.node.focused
    }

    fn actions(&self) -> Vec<String> {
        self.node.actions.clone()
    }

    fn children(&self) -> Vec<Box<dyn UiNode>> {
        self.node
            .children
            .iter()
            .map(|c| {
                Box::new(FakeNode {
                    node: c.clone(),
                    state: self.state.clone(),
                }) as Box<dyn UiNode>
            })
            .collect()
    }

    fn perform(&self, action: &str) -> Result<(), AutomationError> {
        if !self.node.actions.iter().any(|a| a == action) {
            return Err(AutomationError::PlatformError(format!(
                "Action {action} not supported (AXError -25205)"
            )));
        }
        self.state.record(RecordedEvent::Action {
            node_id: self.node.id,
            title: self.node.title.clone(),
            action: action.to_string(),
        });
        Ok(())
    }

    fn set_value(&self, value: &str) -> Result<(), AutomationError> {
        self.state.record(RecordedEvent::SetValue {
            node_id: self.node.id,
            title: self.node.title.clone(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn focus(&self) -> Result<(), AutomationError> {
        self.state.record(RecordedEvent::Focus {
            node_id: self.node.id,
            title: self.node.title.clone(),
        });
        Ok(())
    }

    fn shortcut(&self) -> Option<String> {
        self.node.shortcut.clone()
    }
}

/// The executor-side half of the fake: implements [`Platform`] against the
/// shared [`FakeState`].
pub struct FakePlatform {
    state: Arc<FakeState>,
}

impl FakePlatform {
    pub fn new(state: Arc<FakeState>) -> Self {
        Self { state }
    }
}

impl Platform for FakePlatform {
    fn running_apps(&self) -> Result<Vec<AppInfo>, AutomationError> {
        Ok(self.state.apps.lock().unwrap().clone())
    }

    fn frontmost_app(&self) -> Result<Option<AppInfo>, AutomationError> {
        Ok(self
            .state
            .apps
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.is_frontmost)
            .cloned())
    }

    fn is_running(&self, pid: i32) -> bool {
        self.state.running.lock().unwrap().contains(&pid)
    }

    fn launch(&self, spec: &AppSpec) -> Result<(), AutomationError> {
        self.state.record(RecordedEvent::Launch {
            spec: spec.display().to_string(),
        });
        if let Some(app) = self.state.pending_launch.lock().unwrap().take() {
            self.state.running.lock().unwrap().insert(app.pid);
            self.state.apps.lock().unwrap().push(app);
            return Ok(());
        }
        Err(AutomationError::AppNotFound(format!(
            "Could not launch '{}'",
            spec.display()
        )))
    }

    fn activate(&self, pid: i32) -> Result<(), AutomationError> {
        self.state.record(RecordedEvent::Activate { pid });
        Ok(())
    }

    fn key_event(
        &self,
        keycode: u16,
        down: bool,
        flags: ModifierFlags,
        unicode: Option<&str>,
    ) -> Result<(), AutomationError> {
        self.state.record(RecordedEvent::KeyGlobal {
            keycode,
            down,
            flags,
            unicode: unicode.map(|s| s.to_string()),
        });
        Ok(())
    }

    fn mouse_click(
        &self,
        x: f64,
        y: f64,
        button: MouseButton,
        click_count: u32,
        flags: ModifierFlags,
    ) -> Result<(), AutomationError> {
        self.state.record(RecordedEvent::MouseClick {
            x,
            y,
            button,
            click_count,
            flags,
        });
        Ok(())
    }

    fn scroll(&self, x: f64, y: f64, delta_x: f64, delta_y: f64) -> Result<(), AutomationError> {
        self.state.record(RecordedEvent::ScrollGlobal {
            x,
            y,
            delta_x,
            delta_y,
        });
        Ok(())
    }

    fn key_event_to_pid(
        &self,
        pid: i32,
        keycode: u16,
        down: bool,
        flags: ModifierFlags,
        unicode: Option<&str>,
    ) -> Result<(), AutomationError> {
        if !self.is_running(pid) {
            return Err(AutomationError::AppNotFound(format!(
                "No running process with pid {pid}"
            )));
        }
        self.state.record(RecordedEvent::KeyToPid {
            pid,
            keycode,
            down,
            flags,
            unicode: unicode.map(|s| s.to_string()),
        });
        Ok(())
    }

    fn scroll_to_pid(
        &self,
        pid: i32,
        x: f64,
        y: f64,
        delta_x: f64,
        delta_y: f64,
    ) -> Result<(), AutomationError> {
        if !self.is_running(pid) {
            return Err(AutomationError::AppNotFound(format!(
                "No running process with pid {pid}"
            )));
        }
        self.state.record(RecordedEvent::ScrollToPid {
            pid,
            x,
            y,
            delta_x,
            delta_y,
        });
        Ok(())
    }

    fn app_element(&self, pid: i32) -> Result<Box<dyn UiNode>, AutomationError> {
        if !self.is_running(pid) {
            return Err(AutomationError::AppNotFound(format!(
                "No running process with pid {pid}"
            )));
        }
        if pid != self.state.app.pid {
            return Err(AutomationError::ElementNotFound(format!(
                "No accessibility tree for pid {pid}"
            )));
        }
        Ok(self.state_root())
    }

    fn menu_bar(&self, pid: i32) -> Result<Box<dyn UiNode>, AutomationError> {
        if pid != self.state.app.pid {
            return Err(AutomationError::ElementNotFound(format!(
                "No menu bar for pid {pid}"
            )));
        }
        let menu = self.state.menu.lock().unwrap().clone();
        menu.map(|node| {
            Box::new(FakeNode {
                node,
                state: self.state.clone(),
            }) as Box<dyn UiNode>
        })
        .ok_or_else(|| AutomationError::ElementNotFound("Application has no menu bar".into()))
    }

    fn displays(&self) -> Result<Vec<DisplayInfo>, AutomationError> {
        Ok(self.state.displays.lock().unwrap().clone())
    }

    fn windows(&self, include_offscreen: bool) -> Result<Vec<WindowInfo>, AutomationError> {
        let windows = self.state.windows.lock().unwrap();
        Ok(windows
            .iter()
            .filter(|w| include_offscreen || w.is_on_screen)
            .cloned()
            .collect())
    }

    fn capture_display(&self, display_id: Option<u32>) -> Result<CaptureResult, AutomationError> {
        let displays = self.state.displays.lock().unwrap();
        let display = match display_id {
            Some(id) => displays
                .iter()
                .find(|d| d.display_id == id)
                .ok_or_else(|| {
                    AutomationError::PlatformError(format!("No display with id {id}"))
                })?,
            None => displays
                .iter()
                .find(|d| d.is_main)
                .ok_or_else(|| AutomationError::PlatformError("No main display".into()))?,
        };
        Ok(solid_capture(display.width as u32, display.height as u32))
    }

    fn capture_window(&self, window_id: u32) -> Result<CaptureResult, AutomationError> {
        let windows = self.state.windows.lock().unwrap();
        let window = windows
            .iter()
            .find(|w| w.window_id == window_id)
            .ok_or_else(|| {
                AutomationError::ElementNotFound(format!("No window with id {window_id}"))
            })?;
        Ok(solid_capture(
            window.frame.width as u32,
            window.frame.height as u32,
        ))
    }

    fn main_display_size(&self) -> Result<(f64, f64), AutomationError> {
        let displays = self.state.displays.lock().unwrap();
        displays
            .iter()
            .find(|d| d.is_main)
            .map(|d| (d.width, d.height))
            .ok_or_else(|| AutomationError::PlatformError("No main display".into()))
    }

    fn accessibility_granted(&self) -> bool {
        *self.state.accessibility.lock().unwrap()
    }

    fn screen_recording_granted(&self) -> bool {
        *self.state.screen_recording.lock().unwrap()
    }

    fn open_permission_settings(&self, pane: PermissionPane) -> Result<(), AutomationError> {
        self.state.record(RecordedEvent::OpenSettings {
            pane: match pane {
                PermissionPane::Accessibility => "accessibility",
                PermissionPane::ScreenRecording => "screen_recording",
            },
        });
        Ok(())
    }
}

impl FakePlatform {
    fn state_root(&self) -> Box<dyn UiNode> {
        let node = self.state.tree.lock().unwrap().clone();
        Box::new(FakeNode {
            node,
            state: self.state.clone(),
        })
    }
}

fn solid_capture(width: u32, height: u32) -> CaptureResult {
    let width = width.max(1);
    let height = height.max(1);
    CaptureResult {
        image_data: vec![200; (width * height * 4) as usize],
        width,
        height,
    }
}
