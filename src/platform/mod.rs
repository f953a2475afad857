//! Platform abstraction layer.
//!
//! Defines the `KeyboardCapture` trait and `PlatformError`. The only backend
//! is Windows raw input; other targets get a factory that reports
//! `PlatformError::Unavailable`, so the crate still builds and the C exports
//! simply fail to hook.

#[cfg(target_os = "windows")]
mod windows;

use thiserror::Error;

use crate::config::{HookConfig, InvalidSetting};
use crate::decode::KeyEvent;

/// Receives decoded key events on the capture's worker thread.
pub type KeyCallback = Box<dyn Fn(KeyEvent) + Send>;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("keyboard capture unavailable: {0}")]
    Unavailable(String),
    #[error("RegisterClassW failed (error {0})")]
    ClassRegistration(u32),
    #[error("CreateWindowExW failed (error {0})")]
    WindowCreation(u32),
    #[error("RegisterRawInputDevices failed (error {0})")]
    DeviceRegistration(u32),
    #[error("failed to spawn capture thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("capture thread exited before reporting registration status")]
    ThreadExited,
    #[error("invalid hook configuration: {0}")]
    InvalidConfig(#[from] InvalidSetting),
}

/// A background keyboard capture.
///
/// `start` replaces any running capture; `stop` blocks until the worker thread
/// has exited and is a no-op when idle.
pub trait KeyboardCapture: Send {
    fn start(&mut self, callback: KeyCallback) -> Result<(), PlatformError>;
    fn stop(&mut self) -> Result<(), PlatformError>;
    fn is_running(&self) -> bool;
}

/// Returns the capture backend for the current target.
#[cfg(target_os = "windows")]
pub fn create_keyboard_capture(
    config: &HookConfig,
) -> Result<Box<dyn KeyboardCapture>, PlatformError> {
    windows::create_keyboard_capture(config)
}

/// Returns the capture backend for the current target.
#[cfg(not(target_os = "windows"))]
pub fn create_keyboard_capture(
    _config: &HookConfig,
) -> Result<Box<dyn KeyboardCapture>, PlatformError> {
    Err(PlatformError::Unavailable(
        "raw keyboard input is only supported on Windows".into(),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn factory_reports_unavailable_off_windows() {
        let result = create_keyboard_capture(&HookConfig::default());
        assert!(matches!(result, Err(PlatformError::Unavailable(_))));
    }

    #[test]
    fn error_messages_carry_win32_codes() {
        assert_eq!(
            PlatformError::DeviceRegistration(87).to_string(),
            "RegisterRawInputDevices failed (error 87)"
        );
        assert_eq!(
            PlatformError::WindowCreation(1407).to_string(),
            "CreateWindowExW failed (error 1407)"
        );
    }

    #[test]
    fn invalid_config_names_the_field() {
        let err = PlatformError::from(InvalidSetting {
            field: "hook.window_class",
        });
        assert_eq!(
            err.to_string(),
            "invalid hook configuration: `hook.window_class` must not contain NUL characters"
        );
    }
}
