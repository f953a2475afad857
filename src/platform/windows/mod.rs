//! Windows platform backend: raw input keyboard capture on a message-only window.
//!
//! `RawInputCapture` owns one worker thread. The thread registers a window
//! class, creates a message-only window, registers it for raw keyboard input
//! and pumps messages until `WM_QUIT`.

mod capture;
mod window;

use capture::RawInputCapture;

use crate::config::HookConfig;
use crate::platform::{KeyboardCapture, PlatformError};

/// Returns a `RawInputCapture` configured from `config`. Nothing starts until
/// `KeyboardCapture::start`.
pub fn create_keyboard_capture(
    config: &HookConfig,
) -> Result<Box<dyn KeyboardCapture>, PlatformError> {
    Ok(Box::new(RawInputCapture::new(config.clone())))
}
