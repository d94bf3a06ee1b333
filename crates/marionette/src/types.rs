//! Wire-level data model shared by the library and the HTTP agent.
//!
//! Response field names are lower-snake-case throughout; this is a
//! compatibility contract with existing clients, so every struct here either
//! relies on the default serde naming or pins an explicit rename.

use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Locator for one accessibility node: a process id plus the sequence of
/// child indices walked from the application root. Paths are interpreted
/// against the live tree at action time; staleness fails at navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementPath {
    pub pid: i32,
    pub path: Vec<usize>,
}

impl ElementPath {
    pub fn new(pid: i32, path: Vec<usize>) -> Self {
        Self { pid, path }
    }

    /// Parse the `path` query-parameter form: comma-separated child indices.
    pub fn parse_indices(s: &str) -> Result<Vec<usize>, AutomationError> {
        if s.trim().is_empty() {
            return Ok(Vec::new());
        }
        s.split(',')
            .map(|part| {
                part.trim().parse::<usize>().map_err(|_| {
                    AutomationError::InvalidArgument(format!(
                        "Invalid path component '{}': expected a non-negative integer",
                        part.trim()
                    ))
                })
            })
            .collect()
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indices: Vec<String> = self.path.iter().map(|i| i.to_string()).collect();
        write!(f, "{}:[{}]", self.pid, indices.join(","))
    }
}

/// Screen-space rectangle of an element, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementFrame {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Descriptive snapshot of one accessibility node. Never held across
/// requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIElementInfo {
    pub path: ElementPath,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<ElementFrame>,
    pub is_enabled: bool,
    pub is_focused: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<UIElementInfo>>,
}

/// One entry of the compact (depth-first flattened) tree format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactElement {
    pub depth: usize,
    pub path: ElementPath,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<ElementFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

/// Predicate over accessibility nodes. All provided predicates are ANDed;
/// string predicates are case-insensitive substrings except the exact
/// `title` and `role` matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_contains: Option<String>,
}

impl ElementQuery {
    /// True when at least one predicate is present and non-empty.
    pub fn has_predicates(&self) -> bool {
        let filled = |o: &Option<String>| o.as_deref().is_some_and(|s| !s.is_empty());
        filled(&self.role)
            || filled(&self.title)
            || filled(&self.title_contains)
            || filled(&self.label_contains)
            || filled(&self.value_contains)
    }
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(r) = &self.role {
            parts.push(format!("role={r}"));
        }
        if let Some(t) = &self.title {
            parts.push(format!("title={t}"));
        }
        if let Some(t) = &self.title_contains {
            parts.push(format!("title_contains={t}"));
        }
        if let Some(l) = &self.label_contains {
            parts.push(format!("label_contains={l}"));
        }
        if let Some(v) = &self.value_contains {
            parts.push(format!("value_contains={v}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Closed set of semantic accessibility actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Press,
    SetValue,
    Focus,
    Confirm,
    Cancel,
    Increment,
    Decrement,
    ShowMenu,
    Pick,
}

impl ActionKind {
    /// The accessibility action name this maps to, for the kinds that are
    /// plain named actions. `SetValue` and `Focus` are attribute writes and
    /// return `None`.
    pub fn ax_action(&self) -> Option<&'static str> {
        match self {
            ActionKind::Press => Some("AXPress"),
            ActionKind::Confirm => Some("AXConfirm"),
            ActionKind::Cancel => Some("AXCancel"),
            ActionKind::Increment => Some("AXIncrement"),
            ActionKind::Decrement => Some("AXDecrement"),
            ActionKind::ShowMenu => Some("AXShowMenu"),
            ActionKind::Pick => Some("AXPick"),
            ActionKind::SetValue | ActionKind::Focus => None,
        }
    }
}

/// Keyboard modifiers, with the aliases clients actually send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyModifier {
    Cmd,
    Ctrl,
    Alt,
    Shift,
    Fn,
}

impl FromStr for KeyModifier {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cmd" | "command" | "meta" => Ok(KeyModifier::Cmd),
            "ctrl" | "control" => Ok(KeyModifier::Ctrl),
            "alt" | "option" | "opt" => Ok(KeyModifier::Alt),
            "shift" => Ok(KeyModifier::Shift),
            "fn" | "function" => Ok(KeyModifier::Fn),
            other => Err(AutomationError::InvalidArgument(format!(
                "Unknown modifier '{other}'. Valid modifiers: cmd, ctrl, alt, shift, fn"
            ))),
        }
    }
}

/// Resolved modifier state passed down to the input adapters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierFlags {
    pub cmd: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub function: bool,
}

impl ModifierFlags {
    pub fn from_modifiers(mods: &[KeyModifier]) -> Self {
        let mut flags = ModifierFlags::default();
        for m in mods {
            match m {
                KeyModifier::Cmd => flags.cmd = true,
                KeyModifier::Ctrl => flags.ctrl = true,
                KeyModifier::Alt => flags.alt = true,
                KeyModifier::Shift => flags.shift = true,
                KeyModifier::Fn => flags.function = true,
            }
        }
        flags
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = self.shift || shift;
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == ModifierFlags::default()
    }
}

/// Parse a list of modifier strings, rejecting unknown names.
pub fn parse_modifiers(mods: &[String]) -> Result<ModifierFlags, AutomationError> {
    let parsed: Result<Vec<KeyModifier>, _> = mods.iter().map(|m| m.parse()).collect();
    Ok(ModifierFlags::from_modifiers(&parsed?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Center,
}

/// Text-insertion strategy for `/type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeMode {
    /// Single atomic accessibility `setValue`.
    #[default]
    Replace,
    /// Character-by-character synthesized keystrokes.
    Keys,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    #[default]
    Exists,
    NotExists,
    Enabled,
    Focused,
}

/// Enumerated window snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowInfo {
    pub window_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub app_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    pub pid: i32,
    pub frame: ElementFrame,
    pub is_on_screen: bool,
}

/// Menu-tree node with a display-ready shortcut string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemInfo {
    pub title: String,
    pub is_enabled: bool,
    pub has_submenu: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<MenuItemInfo>,
}

/// Enumerated running-application snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    pub pid: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub is_frontmost: bool,
}

/// The application this server instance is bound to. Immutable after server
/// start. The field names below are the compatibility contract with existing
/// clients (they mirror what the platform's process API calls these things).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetApp {
    pub name: String,
    #[serde(rename = "processIdentifier")]
    pub pid: i32,
    #[serde(rename = "bundleIdentifier", skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
}

/// A connected display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub display_id: u32,
    pub width: f64,
    pub height: f64,
    pub is_main: bool,
}
