//! Display and window capture through CoreGraphics imaging.

use crate::errors::AutomationError;
use crate::screenshot::CaptureResult;
use crate::types::{DisplayInfo, ElementFrame, WindowInfo};
use core_foundation::array::CFArray;
use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::display::CGDisplay;
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_graphics::image::CGImage;
use core_graphics::window::{
    create_image, copy_window_info, kCGNullWindowID, kCGWindowImageBestResolution,
    kCGWindowListExcludeDesktopElements, kCGWindowListOptionAll,
    kCGWindowListOptionIncludingWindow, kCGWindowListOptionOnScreenOnly,
};

pub fn list_displays() -> Result<Vec<DisplayInfo>, AutomationError> {
    let main_id = CGDisplay::main().id;
    let ids = CGDisplay::active_displays()
        .map_err(|e| AutomationError::PlatformError(format!("CGGetActiveDisplayList: {e}")))?;
    Ok(ids
        .into_iter()
        .map(|id| {
            let display = CGDisplay::new(id);
            let bounds = display.bounds();
            DisplayInfo {
                display_id: id,
                width: bounds.size.width,
                height: bounds.size.height,
                is_main: id == main_id,
            }
        })
        .collect())
}

pub fn main_display_size() -> Result<(f64, f64), AutomationError> {
    let bounds = CGDisplay::main().bounds();
    Ok((bounds.size.width, bounds.size.height))
}

pub fn screen_recording_granted() -> bool {
    core_graphics::access::ScreenCaptureAccess::default().preflight()
}

fn dict_string(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<String> {
    dict.find(CFString::new(key))
        .and_then(|v| v.downcast::<CFString>())
        .map(|s| s.to_string())
}

fn dict_i64(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<i64> {
    dict.find(CFString::new(key))
        .and_then(|v| v.downcast::<CFNumber>())
        .and_then(|n| n.to_i64())
}

fn dict_bool(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<bool> {
    dict.find(CFString::new(key))
        .and_then(|v| v.downcast::<CFBoolean>())
        .map(|b| b.into())
}

fn dict_frame(dict: &CFDictionary<CFString, CFType>) -> ElementFrame {
    let bounds = dict
        .find(CFString::new("kCGWindowBounds"))
        .and_then(|v| v.downcast::<CFDictionary>())
        .map(|d| {
            let d: CFDictionary<CFString, CFType> = unsafe {
                CFDictionary::wrap_under_get_rule(d.as_concrete_TypeRef())
            };
            let get = |key: &str| {
                d.find(CFString::new(key))
                    .and_then(|v| v.downcast::<CFNumber>())
                    .and_then(|n| n.to_f64())
                    .unwrap_or(0.0)
            };
            (get("X"), get("Y"), get("Width"), get("Height"))
        })
        .unwrap_or((0.0, 0.0, 0.0, 0.0));
    ElementFrame {
        x: bounds.0,
        y: bounds.1,
        width: bounds.2,
        height: bounds.3,
    }
}

/// Enumerate windows. `include_offscreen` switches the CoreGraphics listing
/// mode; desktop elements are always excluded.
pub fn list_windows(include_offscreen: bool) -> Result<Vec<WindowInfo>, AutomationError> {
    let options = if include_offscreen {
        kCGWindowListOptionAll | kCGWindowListExcludeDesktopElements
    } else {
        kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements
    };
    let info = copy_window_info(options, kCGNullWindowID)
        .ok_or_else(|| AutomationError::PlatformError("CGWindowListCopyWindowInfo failed".into()))?;

    let array: CFArray<CFDictionary<CFString, CFType>> =
        unsafe { CFArray::wrap_under_get_rule(info.as_concrete_TypeRef()) };
    let mut windows = Vec::new();
    for dict in array.iter() {
        let Some(window_id) = dict_i64(&dict, "kCGWindowNumber") else {
            continue;
        };
        let Some(pid) = dict_i64(&dict, "kCGWindowOwnerPID") else {
            continue;
        };
        windows.push(WindowInfo {
            window_id: window_id as u32,
            title: dict_string(&dict, "kCGWindowName").filter(|t| !t.is_empty()),
            app_name: dict_string(&dict, "kCGWindowOwnerName").unwrap_or_default(),
            bundle_id: None,
            pid: pid as i32,
            frame: dict_frame(&dict),
            is_on_screen: dict_bool(&dict, "kCGWindowIsOnscreen").unwrap_or(!include_offscreen),
        });
    }
    Ok(windows)
}

fn image_to_capture(image: CGImage) -> CaptureResult {
    let width = image.width() as u32;
    let height = image.height() as u32;
    let bytes_per_row = image.bytes_per_row();
    let data = image.data();
    let raw = data.bytes();

    // CoreGraphics hands back BGRA with possible row padding; normalize to
    // tightly packed RGBA.
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for row in 0..height as usize {
        let start = row * bytes_per_row;
        for col in 0..width as usize {
            let px = start + col * 4;
            rgba.push(raw[px + 2]);
            rgba.push(raw[px + 1]);
            rgba.push(raw[px]);
            rgba.push(raw[px + 3]);
        }
    }
    CaptureResult {
        image_data: rgba,
        width,
        height,
    }
}

pub fn capture_display(display_id: Option<u32>) -> Result<CaptureResult, AutomationError> {
    let display = match display_id {
        Some(id) => CGDisplay::new(id),
        None => CGDisplay::main(),
    };
    let image = display.image().ok_or_else(|| {
        AutomationError::PlatformError(format!(
            "CGDisplayCreateImage failed for display {}; check screen-recording permission",
            display.id
        ))
    })?;
    Ok(image_to_capture(image))
}

/// The `CGRectNull` sentinel: passing it to `CGWindowListCreateImage`
/// selects the window's own bounds.
fn null_rect() -> CGRect {
    CGRect::new(
        &CGPoint::new(f64::INFINITY, f64::INFINITY),
        &CGSize::new(0.0, 0.0),
    )
}

pub fn capture_window(window_id: u32) -> Result<CaptureResult, AutomationError> {
    let image = create_image(
        null_rect(),
        kCGWindowListOptionIncludingWindow,
        window_id,
        kCGWindowImageBestResolution,
    )
    .ok_or_else(|| {
        AutomationError::PlatformError(format!(
            "CGWindowListCreateImage failed for window {window_id}; check screen-recording permission"
        ))
    })?;
    Ok(image_to_capture(image))
}
