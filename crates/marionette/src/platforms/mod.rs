//! Platform adapter traits.
//!
//! The six capability groups the engine consumes from the OS live behind one
//! `Platform` trait plus an object-safe `UiNode` handle for accessibility
//! elements. Node handles are not `Send`: the OS requires that every
//! accessibility read, input-event post, and capture call originate from one
//! thread, so handles never leave the main-thread executor (see
//! [`crate::executor`]). Everything a handler gets back is a plain snapshot.

use crate::errors::AutomationError;
use crate::screenshot::CaptureResult;
use crate::types::{
    AppInfo, DisplayInfo, ElementFrame, ModifierFlags, MouseButton, WindowInfo,
};

#[cfg(any(test, feature = "fake"))]
pub mod fake;
#[cfg(target_os = "macos")]
pub mod macos;

/// How a `run` invocation names the application to bind to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppSpec {
    /// Display name, matched case-insensitively against running processes.
    Name(String),
    /// Filesystem path to an application bundle.
    Path(String),
    /// Reverse-DNS bundle identifier.
    BundleId(String),
}

impl AppSpec {
    /// Classify a raw CLI argument. Paths win over bundle ids, bundle ids
    /// over names: anything with a separator or `.app` suffix is a path,
    /// anything that looks reverse-DNS (two-plus dots, no spaces) is a
    /// bundle id, the rest is a display name.
    pub fn parse(raw: &str) -> AppSpec {
        let trimmed = raw.trim();
        if trimmed.contains('/') || trimmed.ends_with(".app") {
            return AppSpec::Path(trimmed.to_string());
        }
        if trimmed.matches('.').count() >= 2 && !trimmed.contains(' ') {
            return AppSpec::BundleId(trimmed.to_string());
        }
        AppSpec::Name(trimmed.to_string())
    }

    pub fn display(&self) -> &str {
        match self {
            AppSpec::Name(s) | AppSpec::Path(s) | AppSpec::BundleId(s) => s,
        }
    }
}

/// The system settings panes the permission probe can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionPane {
    Accessibility,
    ScreenRecording,
}

/// Handle to one live accessibility node. Only valid on the executor thread;
/// reads hit the live tree, so any call may fail if the target application
/// mutated or discarded the node.
pub trait UiNode {
    fn role(&self) -> Option<String>;
    fn title(&self) -> Option<String>;
    /// The accessibility label (what assistive technologies announce).
    fn label(&self) -> Option<String>;
    fn value(&self) -> Option<String>;
    /// Longer help/description text, when the node carries one.
    fn description(&self) -> Option<String>;
    fn frame(&self) -> Option<ElementFrame>;
    fn is_enabled(&self) -> bool;
    fn is_focused(&self) -> bool;
    /// Action names the node declares support for.
    fn actions(&self) -> Vec<String>;
    fn children(&self) -> Vec<Box<dyn UiNode>>;

    /// Invoke a named accessibility action.
    fn perform(&self, action: &str) -> Result<(), AutomationError>;
    /// Atomic value replacement through the accessibility attribute.
    fn set_value(&self, value: &str) -> Result<(), AutomationError>;
    /// Move keyboard focus to this node.
    fn focus(&self) -> Result<(), AutomationError>;

    /// Display string of the keyboard shortcut, for menu items.
    fn shortcut(&self) -> Option<String> {
        None
    }
}

impl std::fmt::Debug for dyn UiNode + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiNode")
            .field("role", &self.role())
            .field("title", &self.title())
            .finish()
    }
}

/// The full set of OS capabilities the engine consumes. One implementation
/// object is owned by the main-thread executor; handlers never touch it
/// directly.
pub trait Platform {
    // Process table

    fn running_apps(&self) -> Result<Vec<AppInfo>, AutomationError>;
    fn frontmost_app(&self) -> Result<Option<AppInfo>, AutomationError>;
    fn is_running(&self, pid: i32) -> bool;
    /// Launch the application named by `spec`. Attach-or-launch policy is
    /// the lifecycle coordinator's job; this only starts a process.
    fn launch(&self, spec: &AppSpec) -> Result<(), AutomationError>;
    /// Bring the application to the foreground.
    fn activate(&self, pid: i32) -> Result<(), AutomationError>;

    // Global input synthesis

    fn key_event(
        &self,
        keycode: u16,
        down: bool,
        flags: ModifierFlags,
        unicode: Option<&str>,
    ) -> Result<(), AutomationError>;
    fn mouse_click(
        &self,
        x: f64,
        y: f64,
        button: MouseButton,
        click_count: u32,
        flags: ModifierFlags,
    ) -> Result<(), AutomationError>;
    fn scroll(&self, x: f64, y: f64, delta_x: f64, delta_y: f64) -> Result<(), AutomationError>;

    // Process-targeted input synthesis (delivered to the pid's event
    // stream, bypassing foreground focus)

    fn key_event_to_pid(
        &self,
        pid: i32,
        keycode: u16,
        down: bool,
        flags: ModifierFlags,
        unicode: Option<&str>,
    ) -> Result<(), AutomationError>;
    fn scroll_to_pid(
        &self,
        pid: i32,
        x: f64,
        y: f64,
        delta_x: f64,
        delta_y: f64,
    ) -> Result<(), AutomationError>;

    // Accessibility

    /// The application root element for a pid.
    fn app_element(&self, pid: i32) -> Result<Box<dyn UiNode>, AutomationError>;
    /// The application's menu bar element.
    fn menu_bar(&self, pid: i32) -> Result<Box<dyn UiNode>, AutomationError>;

    // Screen capture

    fn displays(&self) -> Result<Vec<DisplayInfo>, AutomationError>;
    fn windows(&self, include_offscreen: bool) -> Result<Vec<WindowInfo>, AutomationError>;
    fn capture_display(&self, display_id: Option<u32>) -> Result<CaptureResult, AutomationError>;
    fn capture_window(&self, window_id: u32) -> Result<CaptureResult, AutomationError>;
    fn main_display_size(&self) -> Result<(f64, f64), AutomationError>;

    // Permission probe

    fn accessibility_granted(&self) -> bool;
    fn screen_recording_granted(&self) -> bool;
    fn open_permission_settings(&self, pane: PermissionPane) -> Result<(), AutomationError>;
}
