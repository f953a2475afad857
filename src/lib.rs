//! NativeInput -- Windows raw keyboard capture for a managed host.
//!
//! The C exports live in [`ffi`]. Rust callers can drive the same engine
//! through [`create_keyboard_capture`] and the [`KeyboardCapture`] trait.
//!
//! On targets other than Windows the crate builds but capture is unavailable.

pub mod config;
pub mod decode;
pub mod ffi;
pub mod keys;
mod logging;
pub mod platform;

pub use config::{Config, ConfigError, HookConfig, InvalidSetting, LogConfig};
pub use decode::{KeyEvent, KeyState};
pub use keys::RawKey;
pub use platform::{create_keyboard_capture, KeyCallback, KeyboardCapture, PlatformError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_names_side_specific_modifier() {
        let event = KeyEvent {
            vk: 0xA1,
            scan_code: 0x36,
            state: KeyState::Down,
        };
        assert_eq!(event.key(), Some(RawKey::RightShift));
    }
}
