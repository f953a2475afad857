//! Window class registration and the message-only window raw input targets.
//!
//! The class is registered under this module's own handle (the DLL, not the
//! host exe) and unregistered when the worker exits, so an unload/reload of
//! the DLL never finds a class pointing at a stale window procedure.

use std::ptr;

use windows_sys::Win32::Foundation::{
    GetLastError, ERROR_CLASS_ALREADY_EXISTS, HINSTANCE, HMODULE, HWND,
};
use windows_sys::Win32::System::LibraryLoader::{
    GetModuleHandleExW, GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS,
    GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
};
use windows_sys::Win32::UI::Input::{
    RegisterRawInputDevices, RAWINPUTDEVICE, RIDEV_INPUTSINK, RIDEV_REMOVE,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DestroyWindow, GetClassInfoExW, RegisterClassW, UnregisterClassW,
    HWND_MESSAGE, WNDCLASSEXW, WNDCLASSW, WNDPROC,
};

use crate::platform::PlatformError;

const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
const HID_USAGE_GENERIC_KEYBOARD: u16 = 0x06;

/// NUL-terminated UTF-16 copy of `s`.
pub(super) fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Handle of the module containing this code.
fn current_module() -> Result<HINSTANCE, PlatformError> {
    let mut module: HMODULE = ptr::null_mut();
    let address = current_module as *const () as *const u16;
    let ok = unsafe {
        GetModuleHandleExW(
            GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
            address,
            &mut module,
        )
    };
    if ok == 0 {
        return Err(PlatformError::ClassRegistration(unsafe { GetLastError() }));
    }
    Ok(module)
}

fn same_proc(a: WNDPROC, b: WNDPROC) -> bool {
    a.map(|f| f as usize) == b.map(|f| f as usize)
}

/// A registered window class, unregistered on drop.
pub(super) struct WindowClass {
    name: Vec<u16>,
    instance: HINSTANCE,
}

impl WindowClass {
    /// Registers `name` with `window_proc`.
    ///
    /// A class of the same name that already exists is reused only when it
    /// runs `window_proc` (another capture in this process); anyone else's
    /// class is a `ClassRegistration` error.
    pub(super) fn register(name: &str, window_proc: WNDPROC) -> Result<Self, PlatformError> {
        let name = to_wide(name);
        let instance = current_module()?;

        unsafe {
            let mut wc: WNDCLASSW = std::mem::zeroed();
            wc.lpfnWndProc = window_proc;
            wc.hInstance = instance;
            wc.lpszClassName = name.as_ptr();

            if RegisterClassW(&wc) == 0 {
                let err = GetLastError();
                if err != ERROR_CLASS_ALREADY_EXISTS {
                    return Err(PlatformError::ClassRegistration(err));
                }

                let mut existing: WNDCLASSEXW = std::mem::zeroed();
                existing.cbSize = std::mem::size_of::<WNDCLASSEXW>() as u32;
                if GetClassInfoExW(instance, name.as_ptr(), &mut existing) == 0
                    || !same_proc(existing.lpfnWndProc, window_proc)
                {
                    return Err(PlatformError::ClassRegistration(ERROR_CLASS_ALREADY_EXISTS));
                }
                log::debug!("capture: window class already registered by this module, reusing");
            }
        }

        Ok(Self { name, instance })
    }
}

impl Drop for WindowClass {
    fn drop(&mut self) {
        // Fails with ERROR_CLASS_HAS_WINDOWS while another capture still uses
        // the class; that capture unregisters it when it exits.
        if unsafe { UnregisterClassW(self.name.as_ptr(), self.instance) } == 0 {
            log::debug!("capture: window class left registered (error {})", unsafe {
                GetLastError()
            });
        }
    }
}

/// A message-only window, destroyed on drop.
///
/// Must be dropped on the thread that created it, before its `WindowClass`.
pub(super) struct MessageWindow {
    hwnd: HWND,
}

impl MessageWindow {
    pub(super) fn create(class: &WindowClass) -> Result<Self, PlatformError> {
        let hwnd = unsafe {
            CreateWindowExW(
                0,
                class.name.as_ptr(),
                ptr::null(),
                0,
                0,
                0,
                0,
                0,
                HWND_MESSAGE,
                ptr::null_mut(),
                class.instance,
                ptr::null(),
            )
        };
        if hwnd.is_null() {
            return Err(PlatformError::WindowCreation(unsafe { GetLastError() }));
        }
        Ok(Self { hwnd })
    }

    /// Routes raw keyboard input to this window. A message-only window never
    /// has focus, so `RIDEV_INPUTSINK` is required for any input to arrive.
    pub(super) fn register_raw_keyboard(&self) -> Result<(), PlatformError> {
        let device = RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: HID_USAGE_GENERIC_KEYBOARD,
            dwFlags: RIDEV_INPUTSINK,
            hwndTarget: self.hwnd,
        };
        let ok = unsafe {
            RegisterRawInputDevices(&device, 1, std::mem::size_of::<RAWINPUTDEVICE>() as u32)
        };
        if ok == 0 {
            return Err(PlatformError::DeviceRegistration(unsafe { GetLastError() }));
        }
        Ok(())
    }

    /// Stops raw keyboard delivery for this process's registration.
    pub(super) fn unregister_raw_keyboard(&self) {
        let device = RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: HID_USAGE_GENERIC_KEYBOARD,
            dwFlags: RIDEV_REMOVE,
            hwndTarget: ptr::null_mut(),
        };
        let ok = unsafe {
            RegisterRawInputDevices(&device, 1, std::mem::size_of::<RAWINPUTDEVICE>() as u32)
        };
        if ok == 0 {
            log::warn!("capture: removing raw keyboard registration failed (error {})", unsafe {
                GetLastError()
            });
        }
    }
}

impl Drop for MessageWindow {
    fn drop(&mut self) {
        unsafe { DestroyWindow(self.hwnd) };
    }
}
