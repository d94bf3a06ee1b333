//! macOS platform adapters.
//!
//! Accessibility goes through the `AXUIElement` C API, input synthesis
//! through `CGEvent`, capture through CoreGraphics window/display imaging,
//! and process discovery through `sysinfo` plus the System Events scripting
//! interface. Everything here is only ever called from the main-thread
//! executor.

mod accessibility;
mod capture;
mod input;
mod process;

use crate::errors::AutomationError;
use crate::platforms::{AppSpec, PermissionPane, Platform, UiNode};
use crate::screenshot::CaptureResult;
use crate::types::{AppInfo, DisplayInfo, ModifierFlags, MouseButton, WindowInfo};
use std::process::Command;

pub struct MacPlatform {
    process: process::ProcessTable,
}

impl MacPlatform {
    pub fn new() -> Self {
        Self {
            process: process::ProcessTable::new(),
        }
    }
}

impl Default for MacPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for MacPlatform {
    fn running_apps(&self) -> Result<Vec<AppInfo>, AutomationError> {
        self.process.running_apps()
    }

    fn frontmost_app(&self) -> Result<Option<AppInfo>, AutomationError> {
        self.process.frontmost_app()
    }

    fn is_running(&self, pid: i32) -> bool {
        self.process.is_running(pid)
    }

    fn launch(&self, spec: &AppSpec) -> Result<(), AutomationError> {
        self.process.launch(spec)
    }

    fn activate(&self, pid: i32) -> Result<(), AutomationError> {
        self.process.activate(pid)
    }

    fn key_event(
        &self,
        keycode: u16,
        down: bool,
        flags: ModifierFlags,
        unicode: Option<&str>,
    ) -> Result<(), AutomationError> {
        input::post_key_event(None, keycode, down, flags, unicode)
    }

    fn mouse_click(
        &self,
        x: f64,
        y: f64,
        button: MouseButton,
        click_count: u32,
        flags: ModifierFlags,
    ) -> Result<(), AutomationError> {
        input::post_mouse_click(x, y, button, click_count, flags)
    }

    fn scroll(&self, x: f64, y: f64, delta_x: f64, delta_y: f64) -> Result<(), AutomationError> {
        input::post_scroll(None, x, y, delta_x, delta_y)
    }

    fn key_event_to_pid(
        &self,
        pid: i32,
        keycode: u16,
        down: bool,
        flags: ModifierFlags,
        unicode: Option<&str>,
    ) -> Result<(), AutomationError> {
        input::post_key_event(Some(pid), keycode, down, flags, unicode)
    }

    fn scroll_to_pid(
        &self,
        pid: i32,
        x: f64,
        y: f64,
        delta_x: f64,
        delta_y: f64,
    ) -> Result<(), AutomationError> {
        input::post_scroll(Some(pid), x, y, delta_x, delta_y)
    }

    fn app_element(&self, pid: i32) -> Result<Box<dyn UiNode>, AutomationError> {
        if !self.process.is_running(pid) {
            return Err(AutomationError::AppNotFound(format!(
                "No running process with pid {pid}"
            )));
        }
        accessibility::application_element(pid)
    }

    fn menu_bar(&self, pid: i32) -> Result<Box<dyn UiNode>, AutomationError> {
        accessibility::menu_bar_element(pid)
    }

    fn displays(&self) -> Result<Vec<DisplayInfo>, AutomationError> {
        capture::list_displays()
    }

    fn windows(&self, include_offscreen: bool) -> Result<Vec<WindowInfo>, AutomationError> {
        capture::list_windows(include_offscreen)
    }

    fn capture_display(&self, display_id: Option<u32>) -> Result<CaptureResult, AutomationError> {
        capture::capture_display(display_id)
    }

    fn capture_window(&self, window_id: u32) -> Result<CaptureResult, AutomationError> {
        capture::capture_window(window_id)
    }

    fn main_display_size(&self) -> Result<(f64, f64), AutomationError> {
        capture::main_display_size()
    }

    fn accessibility_granted(&self) -> bool {
        unsafe { accessibility_sys::AXIsProcessTrusted() }
    }

    fn screen_recording_granted(&self) -> bool {
        capture::screen_recording_granted()
    }

    fn open_permission_settings(&self, pane: PermissionPane) -> Result<(), AutomationError> {
        let url = match pane {
            PermissionPane::Accessibility => {
                "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility"
            }
            PermissionPane::ScreenRecording => {
                "x-apple.systempreferences:com.apple.preference.security?Privacy_ScreenCapture"
            }
        };
        Command::new("open")
            .arg(url)
            .spawn()
            .map_err(|e| AutomationError::PlatformError(format!("Failed to open {url}: {e}")))?;
        Ok(())
    }
}
