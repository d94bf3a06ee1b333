//! Process discovery and launching.
//!
//! Liveness checks go through `sysinfo`; application enumeration and
//! activation go through the System Events scripting interface, which is
//! the only stable way to see display names, bundle ids, and frontmost
//! state without being an app ourselves. Launching shells out to
//! `/usr/bin/open`, which handles names, bundle paths, and bundle ids.

use crate::errors::AutomationError;
use crate::platforms::AppSpec;
use crate::types::AppInfo;
use std::process::Command;
use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

pub struct ProcessTable {
    system: Mutex<System>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    pub fn is_running(&self, pid: i32) -> bool {
        let mut system = self.system.lock().unwrap();
        system.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid as u32)]), true);
        system.process(Pid::from_u32(pid as u32)).is_some()
    }

    pub fn running_apps(&self) -> Result<Vec<AppInfo>, AutomationError> {
        // Three parallel lists, one property each, keeps the AppleScript
        // output parseable: items are joined with ", " and names cannot be
        // disambiguated if mixed into a single list.
        let names = osascript(
            r#"tell application "System Events" to get name of every application process whose background only is false"#,
        )?;
        let pids = osascript(
            r#"tell application "System Events" to get unix id of every application process whose background only is false"#,
        )?;
        let frontmost = osascript(
            r#"tell application "System Events" to get frontmost of every application process whose background only is false"#,
        )?;

        let names: Vec<&str> = split_list(&names);
        let pids: Vec<&str> = split_list(&pids);
        let frontmost: Vec<&str> = split_list(&frontmost);

        let mut apps = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let Some(pid) = pids.get(i).and_then(|p| p.parse::<i32>().ok()) else {
                continue;
            };
            apps.push(AppInfo {
                pid,
                name: name.to_string(),
                bundle_id: None,
                is_frontmost: frontmost.get(i).is_some_and(|f| *f == "true"),
            });
        }
        Ok(apps)
    }

    pub fn frontmost_app(&self) -> Result<Option<AppInfo>, AutomationError> {
        Ok(self
            .running_apps()?
            .into_iter()
            .find(|app| app.is_frontmost))
    }

    pub fn launch(&self, spec: &AppSpec) -> Result<(), AutomationError> {
        let mut command = Command::new("open");
        match spec {
            AppSpec::Name(name) => command.args(["-a", name]),
            AppSpec::Path(path) => command.arg(path),
            AppSpec::BundleId(bundle_id) => command.args(["-b", bundle_id]),
        };
        let output = command
            .output()
            .map_err(|e| AutomationError::PlatformError(format!("Failed to run open: {e}")))?;
        if !output.status.success() {
            return Err(AutomationError::AppNotFound(format!(
                "Could not launch '{}': {}",
                spec.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    pub fn activate(&self, pid: i32) -> Result<(), AutomationError> {
        osascript(&format!(
            r#"tell application "System Events" to set frontmost of (first application process whose unix id is {pid}) to true"#
        ))?;
        Ok(())
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

fn osascript(script: &str) -> Result<String, AutomationError> {
    let output = Command::new("osascript")
        .arg("-e")
        .arg(script)
        .output()
        .map_err(|e| AutomationError::PlatformError(format!("Failed to run osascript: {e}")))?;
    if !output.status.success() {
        return Err(AutomationError::PlatformError(format!(
            "osascript failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(", ")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}
