//! C ABI exported by `NativeInput.dll`.
//!
//! ```c
//! typedef void (__stdcall *KeyInputCallback)(uint32_t vkCode, bool isDown);
//! bool __stdcall HookKeyboard(KeyInputCallback onKeyInput);
//! void __stdcall UnhookKeyboard(void);
//! bool __stdcall IsKeyboardHooked(void);
//! ```
//!
//! The active capture lives in a process-global `Mutex`, so hook and unhook
//! calls from different host threads are serialised. Failures are logged and
//! collapse to `false`; no error detail crosses the boundary.
//!
//! The callback runs on the capture thread, synchronously, once per key
//! transition. It must not call `UnhookKeyboard` (the unhook would wait on the
//! thread it is running on).

#![allow(non_snake_case)]

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::Config;
use crate::decode::KeyEvent;
use crate::logging;
use crate::platform::{create_keyboard_capture, KeyboardCapture, PlatformError};

/// `void(*)(uint32_t vkCode, bool isDown)`. `None` is a null pointer.
pub type KeyInputCallback = extern "system" fn(vk_code: u32, is_down: bool);

/// The running capture, if any.
static ACTIVE_CAPTURE: Mutex<Option<Box<dyn KeyboardCapture>>> = Mutex::new(None);

fn active_capture() -> MutexGuard<'static, Option<Box<dyn KeyboardCapture>>> {
    // The guarded value is a plain Option; a panic elsewhere cannot leave it torn.
    ACTIVE_CAPTURE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Installs the raw keyboard capture, replacing any existing one.
///
/// Returns `true` once the capture thread has registered for raw input,
/// `false` for a null callback or any setup failure.
#[no_mangle]
pub extern "system" fn HookKeyboard(on_key_input: Option<KeyInputCallback>) -> bool {
    let Some(on_key_input) = on_key_input else {
        return false;
    };

    // A panic must not unwind into the host; it counts as a failed hook.
    panic::catch_unwind(AssertUnwindSafe(|| hook_keyboard(on_key_input))).unwrap_or_else(|_| {
        log::error!("HookKeyboard: panicked while hooking");
        false
    })
}

/// Stops the capture thread and waits for it to exit. No-op when not hooked.
#[no_mangle]
pub extern "system" fn UnhookKeyboard() {
    let result = panic::catch_unwind(|| {
        if let Some(mut capture) = active_capture().take() {
            stop_capture(capture.as_mut());
            log::info!("UnhookKeyboard: keyboard unhooked");
        }
    });
    if result.is_err() {
        log::error!("UnhookKeyboard: panicked while unhooking");
    }
}

/// Whether a capture thread is currently running.
#[no_mangle]
pub extern "system" fn IsKeyboardHooked() -> bool {
    active_capture()
        .as_ref()
        .is_some_and(|capture| capture.is_running())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn hook_keyboard(on_key_input: KeyInputCallback) -> bool {
    let config = load_config();
    let mut active = active_capture();

    if let Some(mut previous) = active.take() {
        log::info!("HookKeyboard: replacing existing hook");
        stop_capture(previous.as_mut());
    }

    match start_capture(&config, on_key_input) {
        Ok(capture) => {
            log::info!("HookKeyboard: keyboard hooked");
            *active = Some(capture);
            true
        }
        Err(e) => {
            log::error!("HookKeyboard: {e}");
            false
        }
    }
}

/// Reads the configuration and brings up logging. A bad config file is
/// reported and replaced by defaults; hooking never fails because of it.
fn load_config() -> Config {
    match Config::load() {
        Ok(config) => {
            logging::init(&config.log.level);
            config
        }
        Err(e) => {
            let config = Config::default();
            logging::init(&config.log.level);
            log::warn!("config: {e}; using defaults");
            config
        }
    }
}

fn start_capture(
    config: &Config,
    on_key_input: KeyInputCallback,
) -> Result<Box<dyn KeyboardCapture>, PlatformError> {
    let mut capture = create_keyboard_capture(&config.hook)?;
    capture.start(Box::new(move |event: KeyEvent| {
        on_key_input(u32::from(event.vk), event.state.is_down())
    }))?;
    Ok(capture)
}

fn stop_capture(capture: &mut dyn KeyboardCapture) {
    if let Err(e) = capture.stop() {
        log::error!("UnhookKeyboard: {e}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
