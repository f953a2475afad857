//! Raw keyboard record decoding.
//!
//! Platform-independent: the Windows backend copies the interesting fields of
//! `RAWKEYBOARD` into a [`RawKeyboard`] and supplies the scan-code resolver
//! (`MapVirtualKeyW` with `MAPVK_VSC_TO_VK_EX`). Everything else here is plain
//! bit twiddling and can be tested on any host.
//!
//! Raw input reports the generic `VK_SHIFT` / `VK_CONTROL` / `VK_MENU` codes
//! for both sides of the keyboard. The side is only recoverable from the scan
//! code, so those three keys are re-resolved from the combined scan code
//! (make code plus E0/E1 prefix).

use crate::keys::RawKey;

// Local constants (avoid relying on module exports that vary by windows-sys version)
pub const RI_KEY_BREAK: u16 = 0x0001;
pub const RI_KEY_E0: u16 = 0x0002;
pub const RI_KEY_E1: u16 = 0x0004;

pub const VK_SHIFT: u16 = 0x10;
pub const VK_CONTROL: u16 = 0x11;
pub const VK_MENU: u16 = 0x12;

const E0_PREFIX: u16 = 0xE000;
const E1_PREFIX: u16 = 0xE100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Whether a key went down or came back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Down,
    Up,
}

impl KeyState {
    pub fn is_down(self) -> bool {
        self == KeyState::Down
    }
}

/// The fields of a `RAWKEYBOARD` record the decoder needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyboard {
    pub make_code: u16,
    pub flags: u16,
    pub vkey: u16,
}

/// A decoded key transition, as forwarded to the registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Virtual-key code; left/right specific for Shift, Control and Alt.
    pub vk: u16,
    /// Make code with the E0/E1 prefix folded into the high byte.
    pub scan_code: u16,
    pub state: KeyState,
}

impl KeyEvent {
    /// The named key, when the virtual-key code has a name.
    pub fn key(&self) -> Option<RawKey> {
        RawKey::from_vk(self.vk)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Folds the E0/E1 prefix flags into the make code (`0x1D` + E0 -> `0xE01D`).
pub fn combine_scan_code(make_code: u16, flags: u16) -> u16 {
    let mut scan_code = make_code;
    if flags & RI_KEY_E0 != 0 {
        scan_code |= E0_PREFIX;
    }
    if flags & RI_KEY_E1 != 0 {
        scan_code |= E1_PREFIX;
    }
    scan_code
}

/// True for the generic modifier codes raw input reports without a side.
pub fn is_sideless_modifier(vk: u16) -> bool {
    matches!(vk, VK_SHIFT | VK_CONTROL | VK_MENU)
}

/// Decodes one raw keyboard record.
///
/// `resolve` maps a combined scan code to an extended virtual-key code and is
/// only called for Shift, Control and Alt. Only the low word of its result is
/// used; a zero result keeps the generic code.
pub fn decode_keyboard<F>(raw: RawKeyboard, resolve: F) -> KeyEvent
where
    F: FnOnce(u16) -> u32,
{
    let scan_code = combine_scan_code(raw.make_code, raw.flags);

    let vk = if is_sideless_modifier(raw.vkey) {
        match resolve(scan_code) as u16 {
            0 => raw.vkey,
            resolved => resolved,
        }
    } else {
        raw.vkey
    };

    let state = if raw.flags & RI_KEY_BREAK == 0 {
        KeyState::Down
    } else {
        KeyState::Up
    };

    KeyEvent {
        vk,
        scan_code,
        state,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Stand-in for `MapVirtualKeyW(.., MAPVK_VSC_TO_VK_EX)` on a US layout.
    fn us_layout(scan_code: u16) -> u32 {
        match scan_code {
            0x2A => 0xA0,   // VK_LSHIFT
            0x36 => 0xA1,   // VK_RSHIFT
            0x1D => 0xA2,   // VK_LCONTROL
            0xE01D => 0xA3, // VK_RCONTROL
            0x38 => 0xA4,   // VK_LMENU
            0xE038 => 0xA5, // VK_RMENU
            _ => 0,
        }
    }

    fn raw(make_code: u16, flags: u16, vkey: u16) -> RawKeyboard {
        RawKeyboard {
            make_code,
            flags,
            vkey,
        }
    }

    #[test]
    fn plain_scan_code_is_unchanged() {
        assert_eq!(combine_scan_code(0x1E, 0), 0x1E);
        assert_eq!(combine_scan_code(0x1E, RI_KEY_BREAK), 0x1E);
    }

    #[test]
    fn prefix_flags_fold_into_high_byte() {
        assert_eq!(combine_scan_code(0x1D, RI_KEY_E0), 0xE01D);
        assert_eq!(combine_scan_code(0x1D, RI_KEY_E1), 0xE11D);
        assert_eq!(combine_scan_code(0x38, RI_KEY_E0 | RI_KEY_BREAK), 0xE038);
    }

    #[test]
    fn break_flag_selects_key_up() {
        assert_eq!(decode_keyboard(raw(0x1E, 0, 0x41), us_layout).state, KeyState::Down);
        assert_eq!(
            decode_keyboard(raw(0x1E, RI_KEY_BREAK, 0x41), us_layout).state,
            KeyState::Up
        );
    }

    #[test]
    fn shift_resolves_to_side_specific_code() {
        assert_eq!(decode_keyboard(raw(0x2A, 0, VK_SHIFT), us_layout).vk, 0xA0);
        assert_eq!(decode_keyboard(raw(0x36, 0, VK_SHIFT), us_layout).vk, 0xA1);
    }

    #[test]
    fn right_control_and_alt_use_e0_scan_code() {
        let ctrl = decode_keyboard(raw(0x1D, RI_KEY_E0, VK_CONTROL), us_layout);
        assert_eq!(ctrl.vk, 0xA3);
        assert_eq!(ctrl.scan_code, 0xE01D);

        let alt = decode_keyboard(raw(0x38, RI_KEY_E0 | RI_KEY_BREAK, VK_MENU), us_layout);
        assert_eq!(alt.vk, 0xA5);
        assert_eq!(alt.state, KeyState::Up);

        assert_eq!(decode_keyboard(raw(0x1D, 0, VK_CONTROL), us_layout).vk, 0xA2);
        assert_eq!(decode_keyboard(raw(0x38, 0, VK_MENU), us_layout).vk, 0xA4);
    }

    #[test]
    fn resolver_is_not_called_for_other_keys() {
        let calls = Cell::new(0);
        let event = decode_keyboard(raw(0x1C, RI_KEY_E0, 0x0D), |_| {
            calls.set(calls.get() + 1);
            0
        });
        assert_eq!(calls.get(), 0);
        assert_eq!(event.vk, 0x0D);
        assert_eq!(event.scan_code, 0xE01C);
    }

    #[test]
    fn unresolved_modifier_keeps_generic_code() {
        assert_eq!(decode_keyboard(raw(0x00, 0, VK_SHIFT), us_layout).vk, VK_SHIFT);
    }

    #[test]
    fn only_low_word_of_resolution_is_used() {
        let event = decode_keyboard(raw(0x2A, 0, VK_SHIFT), |_| 0x0001_00A0);
        assert_eq!(event.vk, 0xA0);
    }

    #[test]
    fn fake_keys_pass_through() {
        // Pause sends an E1-prefixed VK 0xFF before the real key.
        let event = decode_keyboard(raw(0x1D, RI_KEY_E1, 0xFF), us_layout);
        assert_eq!(event.vk, 0xFF);
        assert_eq!(event.scan_code, 0xE11D);
    }

    #[test]
    fn key_state_is_down() {
        assert!(KeyState::Down.is_down());
        assert!(!KeyState::Up.is_down());
    }
}
