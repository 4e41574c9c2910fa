//! AppKit and CoreGraphics calls.
//!
//! Screen frames are converted from `NSScreen`'s bottom-left origin to the
//! top-left origin used by `CGWindowList`, so window bounds can be compared
//! against them.

use std::ffi::{CStr, c_void};
use std::path::Path;

use objc::runtime::{Class, Object};
use objc::{msg_send, sel, sel_impl};
use thiserror::Error;

use crate::display::{Bounds, MonitorDescriptor};

#[derive(Debug, Error)]
pub enum MacError {
    #[error("Objective-C class {0} is unavailable")]
    MissingClass(&'static str),
    #[error("{0} returned nil")]
    Nil(&'static str),
    #[error("no screen at index {0}")]
    InvalidScreen(usize),
    #[error("{0}")]
    Api(String),
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
struct NSPoint {
    x: f64,
    y: f64,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
struct NSSize {
    width: f64,
    height: f64,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
struct NSRect {
    origin: NSPoint,
    size: NSSize,
}

const CG_WINDOW_LIST_ON_SCREEN_ONLY: u32 = 1 << 0;
const CG_WINDOW_LIST_EXCLUDE_DESKTOP: u32 = 1 << 4;
const CG_NULL_WINDOW_ID: u32 = 0;
const NS_UTF8_STRING_ENCODING: u64 = 4;

#[link(name = "CoreGraphics", kind = "framework")]
unsafe extern "C" {
    fn CGWindowListCopyWindowInfo(option: u32, relative_to: u32) -> *const c_void;
}

fn class(name: &'static str) -> Result<&'static Class, MacError> {
    Class::get(name).ok_or(MacError::MissingClass(name))
}

/// Creates an autoreleased `NSString`.
unsafe fn nsstring(value: &str) -> Result<*mut Object, MacError> {
    let string_class = class("NSString")?;
    let string: *mut Object = unsafe { msg_send![string_class, alloc] };
    let string: *mut Object = unsafe {
        msg_send![string, initWithBytes:value.as_ptr() length:value.len() encoding:NS_UTF8_STRING_ENCODING]
    };
    if string.is_null() {
        return Err(MacError::Nil("NSString initWithBytes"));
    }
    Ok(unsafe { msg_send![string, autorelease] })
}

unsafe fn nsstring_to_string(string: *mut Object) -> Option<String> {
    if string.is_null() {
        return None;
    }
    let bytes: *const std::ffi::c_char = unsafe { msg_send![string, UTF8String] };
    if bytes.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(bytes) }.to_string_lossy().into_owned())
}

unsafe fn number_for_key(dict: *mut Object, key: &str) -> Result<Option<f64>, MacError> {
    let key = unsafe { nsstring(key)? };
    let value: *mut Object = unsafe { msg_send![dict, objectForKey: key] };
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(unsafe { msg_send![value, doubleValue] }))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_bounds(x: f64, y: f64, width: f64, height: f64) -> Bounds {
    Bounds {
        x: x.round() as i32,
        y: y.round() as i32,
        width: width.max(0.0).round() as u32,
        height: height.max(0.0).round() as u32,
    }
}

fn flip(rect: NSRect, main_height: f64) -> Bounds {
    to_bounds(
        rect.origin.x,
        main_height - rect.origin.y - rect.size.height,
        rect.size.width,
        rect.size.height,
    )
}

/// Screen frame in points (top-left origin) plus its backing scale.
struct ScreenInfo {
    name: String,
    frame: Bounds,
    scale: f64,
    primary: bool,
}

unsafe fn screen_infos() -> Result<Vec<ScreenInfo>, MacError> {
    let screen_class = class("NSScreen")?;
    let ns_screens: *mut Object = unsafe { msg_send![screen_class, screens] };
    if ns_screens.is_null() {
        return Err(MacError::Nil("NSScreen screens"));
    }

    // NSScreen uses a bottom-left origin anchored on the main screen.
    let main_screen: *mut Object = unsafe { msg_send![screen_class, mainScreen] };
    let main_height = if main_screen.is_null() {
        0.0
    } else {
        let frame: NSRect = unsafe { msg_send![main_screen, frame] };
        frame.size.height
    };

    let count: usize = unsafe { msg_send![ns_screens, count] };
    let mut infos = Vec::with_capacity(count);
    for index in 0..count {
        let screen: *mut Object = unsafe { msg_send![ns_screens, objectAtIndex: index] };
        if screen.is_null() {
            continue;
        }
        let frame: NSRect = unsafe { msg_send![screen, frame] };
        let scale: f64 = unsafe { msg_send![screen, backingScaleFactor] };
        let name: *mut Object = unsafe { msg_send![screen, localizedName] };
        infos.push(ScreenInfo {
            name: unsafe { nsstring_to_string(name) }
                .unwrap_or_else(|| format!("Display {}", index + 1)),
            frame: flip(frame, main_height),
            scale: if scale > 0.0 { scale } else { 1.0 },
            primary: std::ptr::eq(screen, main_screen),
        });
    }

    Ok(infos)
}

/// Connected screens with pixel bounds; the one holding the menu bar is primary.
///
/// # Errors
///
/// Returns an error when `NSScreen` cannot be queried.
pub fn screens() -> Result<Vec<MonitorDescriptor>, MacError> {
    let infos = unsafe { screen_infos()? };

    Ok(infos
        .into_iter()
        .enumerate()
        .map(|(index, info)| MonitorDescriptor {
            index,
            name: info.name,
            bounds: to_bounds(
                f64::from(info.frame.x) * info.scale,
                f64::from(info.frame.y) * info.scale,
                f64::from(info.frame.width) * info.scale,
                f64::from(info.frame.height) * info.scale,
            ),
            primary: info.primary,
        })
        .collect())
}

/// Whether the frontmost normal-layer window covers a whole screen.
///
/// # Errors
///
/// Returns an error when the window list is unavailable.
pub fn frontmost_window_covers_screen() -> Result<bool, MacError> {
    // Window bounds are in points, so compare against point frames.
    let screens = unsafe { screen_infos()? };

    unsafe {
        let list = CGWindowListCopyWindowInfo(
            CG_WINDOW_LIST_ON_SCREEN_ONLY | CG_WINDOW_LIST_EXCLUDE_DESKTOP,
            CG_NULL_WINDOW_ID,
        );
        if list.is_null() {
            return Err(MacError::Nil("CGWindowListCopyWindowInfo"));
        }
        // CFArray is toll-free bridged to NSArray.
        let windows = list.cast_mut().cast::<Object>();
        let result = frontmost_bounds(windows);
        let _: () = msg_send![windows, release];

        let Some(bounds) = result? else {
            return Ok(false);
        };
        Ok(screens.iter().any(|screen| covers(bounds, screen.frame)))
    }
}

fn covers(window: Bounds, screen: Bounds) -> bool {
    let right = |b: Bounds| i64::from(b.x) + i64::from(b.width);
    let bottom = |b: Bounds| i64::from(b.y) + i64::from(b.height);
    window.x <= screen.x
        && window.y <= screen.y
        && right(window) >= right(screen)
        && bottom(window) >= bottom(screen)
}

/// Bounds of the first window on layer 0 (ordinary application windows),
/// which the window list returns front to back.
unsafe fn frontmost_bounds(windows: *mut Object) -> Result<Option<Bounds>, MacError> {
    let count: usize = unsafe { msg_send![windows, count] };
    for i in 0..count {
        let info: *mut Object = unsafe { msg_send![windows, objectAtIndex: i] };
        if info.is_null() {
            continue;
        }
        if unsafe { number_for_key(info, "kCGWindowLayer")? } != Some(0.0) {
            continue;
        }

        let key = unsafe { nsstring("kCGWindowBounds")? };
        let rect: *mut Object = unsafe { msg_send![info, objectForKey: key] };
        if rect.is_null() {
            continue;
        }
        let field = |name| unsafe { number_for_key(rect, name) };
        let (Some(x), Some(y), Some(w), Some(h)) =
            (field("X")?, field("Y")?, field("Width")?, field("Height")?)
        else {
            continue;
        };
        return Ok(Some(to_bounds(x, y, w, h)));
    }
    Ok(None)
}

/// Sets the desktop picture of the screen at `screen_index`.
///
/// # Errors
///
/// Returns an error when the screen does not exist or `NSWorkspace` refuses
/// the image.
pub fn set_desktop_image(path: &Path, screen_index: usize) -> Result<(), MacError> {
    unsafe {
        let screens: *mut Object = msg_send![class("NSScreen")?, screens];
        if screens.is_null() {
            return Err(MacError::Nil("NSScreen screens"));
        }
        let count: usize = msg_send![screens, count];
        if screen_index >= count {
            return Err(MacError::InvalidScreen(screen_index));
        }
        let screen: *mut Object = msg_send![screens, objectAtIndex: screen_index];
        if screen.is_null() {
            return Err(MacError::InvalidScreen(screen_index));
        }

        let workspace: *mut Object = msg_send![class("NSWorkspace")?, sharedWorkspace];
        if workspace.is_null() {
            return Err(MacError::Nil("NSWorkspace sharedWorkspace"));
        }

        let path_ns = nsstring(&path.display().to_string())?;
        let url: *mut Object = msg_send![class("NSURL")?, fileURLWithPath: path_ns];
        if url.is_null() {
            return Err(MacError::Nil("NSURL fileURLWithPath"));
        }

        let options: *mut Object = msg_send![class("NSDictionary")?, dictionary];
        let mut error: *mut Object = std::ptr::null_mut();
        let success: bool =
            msg_send![workspace, setDesktopImageURL:url forScreen:screen options:options error:&mut error];

        if success {
            return Ok(());
        }

        let message = if error.is_null() {
            None
        } else {
            let description: *mut Object = msg_send![error, localizedDescription];
            nsstring_to_string(description)
        };
        Err(MacError::Api(message.unwrap_or_else(|| "unknown error".to_string())))
    }
}
