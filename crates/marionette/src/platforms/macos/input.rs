//! `CGEvent` synthesis for keyboard, mouse, and scroll.
//!
//! Global events post through the HID tap; process-targeted events post to
//! the pid's event stream, which delivers them regardless of foreground
//! focus.

use crate::errors::AutomationError;
use crate::types::{ModifierFlags, MouseButton};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTapLocation, CGEventType, CGMouseButton, EventField,
    ScrollEventUnit,
};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::CGPoint;

fn event_source() -> Result<CGEventSource, AutomationError> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| AutomationError::PlatformError("Failed to create CGEventSource".into()))
}

fn cg_flags(flags: ModifierFlags) -> CGEventFlags {
    let mut out = CGEventFlags::empty();
    if flags.cmd {
        out |= CGEventFlags::CGEventFlagCommand;
    }
    if flags.ctrl {
        out |= CGEventFlags::CGEventFlagControl;
    }
    if flags.alt {
        out |= CGEventFlags::CGEventFlagAlternate;
    }
    if flags.shift {
        out |= CGEventFlags::CGEventFlagShift;
    }
    if flags.function {
        out |= CGEventFlags::CGEventFlagSecondaryFn;
    }
    out
}

fn post(event: &CGEvent, pid: Option<i32>) {
    match pid {
        Some(pid) => event.post_to_pid(pid),
        None => event.post(CGEventTapLocation::HID),
    }
}

/// Post one key-down or key-up. `unicode` carries the payload for
/// characters outside the keycode table; the OS uses it verbatim.
pub fn post_key_event(
    pid: Option<i32>,
    keycode: u16,
    down: bool,
    flags: ModifierFlags,
    unicode: Option<&str>,
) -> Result<(), AutomationError> {
    let source = event_source()?;
    let event = CGEvent::new_keyboard_event(source, keycode, down)
        .map_err(|_| AutomationError::PlatformError("Failed to create keyboard event".into()))?;
    if !flags.is_empty() {
        event.set_flags(cg_flags(flags));
    }
    if let Some(text) = unicode {
        event.set_string(text);
    }
    post(&event, pid);
    Ok(())
}

/// A full click: `click_count` down/up pairs with the proper click-state
/// field so the OS recognizes double and triple clicks.
pub fn post_mouse_click(
    x: f64,
    y: f64,
    button: MouseButton,
    click_count: u32,
    flags: ModifierFlags,
) -> Result<(), AutomationError> {
    let source = event_source()?;
    let point = CGPoint::new(x, y);
    let (down_type, up_type, cg_button) = match button {
        MouseButton::Left => (
            CGEventType::LeftMouseDown,
            CGEventType::LeftMouseUp,
            CGMouseButton::Left,
        ),
        MouseButton::Right => (
            CGEventType::RightMouseDown,
            CGEventType::RightMouseUp,
            CGMouseButton::Right,
        ),
        MouseButton::Center => (
            CGEventType::OtherMouseDown,
            CGEventType::OtherMouseUp,
            CGMouseButton::Center,
        ),
    };

    for count in 1..=click_count.max(1) {
        for event_type in [down_type, up_type] {
            let event =
                CGEvent::new_mouse_event(source.clone(), event_type, point, cg_button).map_err(
                    |_| AutomationError::PlatformError("Failed to create mouse event".into()),
                )?;
            event.set_integer_value_field(EventField::MOUSE_EVENT_CLICK_STATE, count as i64);
            if !flags.is_empty() {
                event.set_flags(cg_flags(flags));
            }
            event.post(CGEventTapLocation::HID);
        }
    }
    Ok(())
}

/// Pixel-unit scroll at `(x, y)`. The cursor is moved there first because
/// scroll-wheel events apply at the pointer location.
pub fn post_scroll(
    pid: Option<i32>,
    x: f64,
    y: f64,
    delta_x: f64,
    delta_y: f64,
) -> Result<(), AutomationError> {
    let source = event_source()?;

    let moved = CGEvent::new_mouse_event(
        source.clone(),
        CGEventType::MouseMoved,
        CGPoint::new(x, y),
        CGMouseButton::Left,
    )
    .map_err(|_| AutomationError::PlatformError("Failed to create mouse-moved event".into()))?;
    post(&moved, pid);

    let scroll = CGEvent::new_scroll_event(
        source,
        ScrollEventUnit::PIXEL,
        2,
        delta_y as i32,
        delta_x as i32,
        0,
    )
    .map_err(|_| AutomationError::PlatformError("Failed to create scroll event".into()))?;
    post(&scroll, pid);
    Ok(())
}
