//! `AXUIElement` wrappers.
//!
//! Attribute reads go through `AXUIElementCopyAttributeValue`; every failure
//! maps to `None` (missing attribute) or a `PlatformError` carrying the raw
//! `AXError` code so it survives into the HTTP error envelope.

use crate::errors::AutomationError;
use crate::platforms::UiNode;
use crate::types::ElementFrame;
use accessibility_sys::{
    kAXChildrenAttribute, kAXDescriptionAttribute, kAXEnabledAttribute, kAXErrorSuccess,
    kAXFocusedAttribute, kAXHelpAttribute, kAXMenuBarAttribute, kAXPositionAttribute,
    kAXRoleAttribute, kAXSizeAttribute, kAXTitleAttribute, kAXValueAttribute,
    kAXValueTypeCGPoint, kAXValueTypeCGSize, AXError, AXUIElementCopyActionNames,
    AXUIElementCopyAttributeValue, AXUIElementCreateApplication, AXUIElementPerformAction,
    AXUIElementRef, AXUIElementSetAttributeValue, AXValueGetType, AXValueGetValue, AXValueRef,
};
use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFGetTypeID, CFRelease, CFType, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::string::{CFString, CFStringRef};
use core_graphics::geometry::{CGPoint, CGSize};

/// Owned `AXUIElementRef`. Released on drop; clones retain.
pub struct AxElement {
    raw: AXUIElementRef,
}

unsafe impl Send for AxElement {}

impl AxElement {
    /// Takes ownership of a +1 reference.
    unsafe fn from_create(raw: AXUIElementRef) -> Self {
        Self { raw }
    }

    /// Retains a borrowed reference.
    unsafe fn from_borrowed(raw: AXUIElementRef) -> Self {
        core_foundation::base::CFRetain(raw as CFTypeRef);
        Self { raw }
    }

    fn copy_attribute(&self, attr: &str) -> Option<CFType> {
        let attr = CFString::new(attr);
        let mut value: CFTypeRef = std::ptr::null();
        let err = unsafe {
            AXUIElementCopyAttributeValue(
                self.raw,
                attr.as_concrete_TypeRef() as CFStringRef,
                &mut value,
            )
        };
        if err != kAXErrorSuccess || value.is_null() {
            return None;
        }
        Some(unsafe { CFType::wrap_under_create_rule(value) })
    }

    fn string_attribute(&self, attr: &str) -> Option<String> {
        let value = self.copy_attribute(attr)?;
        value.downcast::<CFString>().map(|s| s.to_string())
    }

    fn bool_attribute(&self, attr: &str) -> Option<bool> {
        let value = self.copy_attribute(attr)?;
        value.downcast::<CFBoolean>().map(|b| b.into())
    }

    fn point_attribute(&self, attr: &str) -> Option<CGPoint> {
        let value = self.copy_attribute(attr)?;
        let ax_value = value.as_CFTypeRef() as AXValueRef;
        unsafe {
            if AXValueGetType(ax_value) != kAXValueTypeCGPoint {
                return None;
            }
            let mut point = CGPoint::new(0.0, 0.0);
            if AXValueGetValue(
                ax_value,
                kAXValueTypeCGPoint,
                &mut point as *mut CGPoint as *mut _,
            ) {
                Some(point)
            } else {
                None
            }
        }
    }

    fn size_attribute(&self, attr: &str) -> Option<CGSize> {
        let value = self.copy_attribute(attr)?;
        let ax_value = value.as_CFTypeRef() as AXValueRef;
        unsafe {
            if AXValueGetType(ax_value) != kAXValueTypeCGSize {
                return None;
            }
            let mut size = CGSize::new(0.0, 0.0);
            if AXValueGetValue(
                ax_value,
                kAXValueTypeCGSize,
                &mut size as *mut CGSize as *mut _,
            ) {
                Some(size)
            } else {
                None
            }
        }
    }

    fn element_array_attribute(&self, attr: &str) -> Vec<AxElement> {
        let Some(value) = self.copy_attribute(attr) else {
            return Vec::new();
        };
        if unsafe { CFGetTypeID(value.as_CFTypeRef()) } != CFArray::<CFType>::type_id() {
            return Vec::new();
        }
        let array: CFArray<CFType> =
            unsafe { CFArray::wrap_under_get_rule(value.as_CFTypeRef() as CFArrayRef) };
        array
            .iter()
            .map(|item| unsafe { AxElement::from_borrowed(item.as_CFTypeRef() as AXUIElementRef) })
            .collect()
    }

    fn set_attribute(&self, attr: &str, value: CFTypeRef) -> Result<(), AutomationError> {
        let attr_name = CFString::new(attr);
        let err = unsafe {
            AXUIElementSetAttributeValue(
                self.raw,
                attr_name.as_concrete_TypeRef() as CFStringRef,
                value,
            )
        };
        check_ax(err, &format!("set {attr}"))
    }
}

impl Drop for AxElement {
    fn drop(&mut self) {
        unsafe { CFRelease(self.raw as CFTypeRef) };
    }
}

fn check_ax(err: AXError, what: &str) -> Result<(), AutomationError> {
    if err == kAXErrorSuccess {
        Ok(())
    } else {
        Err(AutomationError::PlatformError(format!(
            "Accessibility call '{what}' failed (AXError {err})"
        )))
    }
}

/// The application root element for a pid.
pub fn application_element(pid: i32) -> Result<Box<dyn UiNode>, AutomationError> {
    let element = unsafe { AxElement::from_create(AXUIElementCreateApplication(pid)) };
    // A role read doubles as the reachability probe: it fails for dead pids
    // and when the accessibility entitlement is missing.
    if element.string_attribute(kAXRoleAttribute).is_none() {
        return Err(AutomationError::PermissionDenied(format!(
            "Cannot read accessibility tree of pid {pid}; check that accessibility \
             permission is granted in System Settings > Privacy & Security"
        )));
    }
    Ok(Box::new(element))
}

/// The application's menu bar element.
pub fn menu_bar_element(pid: i32) -> Result<Box<dyn UiNode>, AutomationError> {
    let app = unsafe { AxElement::from_create(AXUIElementCreateApplication(pid)) };
    let value = app.copy_attribute(kAXMenuBarAttribute).ok_or_else(|| {
        AutomationError::ElementNotFound(format!("Application {pid} has no menu bar"))
    })?;
    let element =
        unsafe { AxElement::from_borrowed(value.as_CFTypeRef() as AXUIElementRef) };
    Ok(Box::new(element))
}

// AXMenuItemCmdModifiers bit meanings; an empty mask means plain Command.
const MENU_MODIFIER_SHIFT: i64 = 1 << 0;
const MENU_MODIFIER_OPTION: i64 = 1 << 1;
const MENU_MODIFIER_CONTROL: i64 = 1 << 2;
const MENU_MODIFIER_NO_COMMAND: i64 = 1 << 3;

impl AxElement {
    fn number_attribute(&self, attr: &str) -> Option<i64> {
        let value = self.copy_attribute(attr)?;
        value
            .downcast::<core_foundation::number::CFNumber>()
            .and_then(|n| n.to_i64())
    }
}

impl UiNode for AxElement {
    fn role(&self) -> Option<String> {
        self.string_attribute(kAXRoleAttribute)
    }

    fn title(&self) -> Option<String> {
        self.string_attribute(kAXTitleAttribute)
    }

    fn label(&self) -> Option<String> {
        self.string_attribute(kAXDescriptionAttribute)
    }

    fn value(&self) -> Option<String> {
        self.string_attribute(kAXValueAttribute)
    }

    fn description(&self) -> Option<String> {
        self.string_attribute(kAXHelpAttribute)
    }

    fn frame(&self) -> Option<ElementFrame> {
        let position = self.point_attribute(kAXPositionAttribute)?;
        let size = self.size_attribute(kAXSizeAttribute)?;
        Some(ElementFrame {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        })
    }

    fn is_enabled(&self) -> bool {
        self.bool_attribute(kAXEnabledAttribute).unwrap_or(true)
    }

    fn is_focused(&self) -> bool {
        self.bool_attribute(kAXFocusedAttribute).unwrap_or(false)
    }

    fn actions(&self) -> Vec<String> {
        let mut names: CFArrayRef = std::ptr::null();
        let err = unsafe { AXUIElementCopyActionNames(self.raw, &mut names) };
        if err != kAXErrorSuccess || names.is_null() {
            return Vec::new();
        }
        let array: CFArray<CFString> = unsafe { CFArray::wrap_under_create_rule(names) };
        array.iter().map(|s| s.to_string()).collect()
    }

    fn children(&self) -> Vec<Box<dyn UiNode>> {
        self.element_array_attribute(kAXChildrenAttribute)
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn UiNode>)
            .collect()
    }

    fn perform(&self, action: &str) -> Result<(), AutomationError> {
        let name = CFString::new(action);
        let err = unsafe {
            AXUIElementPerformAction(self.raw, name.as_concrete_TypeRef() as CFStringRef)
        };
        check_ax(err, action)
    }

    fn set_value(&self, value: &str) -> Result<(), AutomationError> {
        let cf_value = CFString::new(value);
        self.set_attribute(kAXValueAttribute, cf_value.as_CFTypeRef())
    }

    fn focus(&self) -> Result<(), AutomationError> {
        self.set_attribute(
            kAXFocusedAttribute,
            CFBoolean::true_value().as_CFTypeRef(),
        )
    }

    fn shortcut(&self) -> Option<String> {
        let cmd_char = self.string_attribute("AXMenuItemCmdChar")?;
        if cmd_char.is_empty() {
            return None;
        }
        let modifiers = self.number_attribute("AXMenuItemCmdModifiers").unwrap_or(0);
        let mut display = String::new();
        if modifiers & MENU_MODIFIER_CONTROL != 0 {
            display.push('⌃');
        }
        if modifiers & MENU_MODIFIER_OPTION != 0 {
            display.push('⌥');
        }
        if modifiers & MENU_MODIFIER_SHIFT != 0 {
            display.push('⇧');
        }
        if modifiers & MENU_MODIFIER_NO_COMMAND == 0 {
            display.push('⌘');
        }
        display.push_str(&cmd_char);
        Some(display)
    }
}
