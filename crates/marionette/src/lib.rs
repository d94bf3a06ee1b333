//! macOS UI automation primitives.
//!
//! This crate is the platform half of the marionette agent: adapter traits
//! over the OS's accessibility, input-injection, and screen-capture
//! facilities, a main-thread executor that models the OS's threading
//! requirement in one place, and the element addressing / polling logic the
//! HTTP dispatch layer is built on.

pub mod element;
pub mod errors;
pub mod executor;
pub mod keymap;
pub mod platforms;
pub mod screenshot;
pub mod types;
pub mod wait;

pub use errors::AutomationError;
pub use executor::PlatformHandle;
pub use platforms::{AppSpec, PermissionPane, Platform, UiNode};
pub use screenshot::CaptureResult;
pub use types::{
    ActionKind, AppInfo, CompactElement, DisplayInfo, ElementFrame, ElementPath, ElementQuery,
    KeyModifier, MenuItemInfo, ModifierFlags, MouseButton, TargetApp, TypeMode, UIElementInfo,
    WaitCondition, WindowInfo,
};
pub use wait::{WaitOutcome, wait_for};
