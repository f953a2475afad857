//! Named Windows virtual-key codes.
//!
//! VK codes are from the Windows SDK (winuser.h). Unlike the generic codes raw
//! input reports, the decoder produces left/right specific modifier codes
//! (VK_LSHIFT, VK_RCONTROL, ...), so both sides have their own variant here.
//!
//! `RawKey` is used for naming keys in logs and by Rust callers. The C ABI
//! always forwards the numeric code, named or not.

use std::fmt;

/// A Windows virtual-key code with a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RawKey {
    // Mouse buttons
    LeftButton = 0x01,
    RightButton = 0x02,
    Cancel = 0x03,
    MiddleButton = 0x04,
    ExtraButton1 = 0x05,
    ExtraButton2 = 0x06,

    // Editing and control
    Back = 0x08,
    Tab = 0x09,
    Clear = 0x0C,
    Return = 0x0D,
    Shift = 0x10,
    Control = 0x11,
    Menu = 0x12,
    Pause = 0x13,
    CapsLock = 0x14,
    Escape = 0x1B,
    Space = 0x20,

    // Navigation
    Prior = 0x21,
    Next = 0x22,
    End = 0x23,
    Home = 0x24,
    Left = 0x25,
    Up = 0x26,
    Right = 0x27,
    Down = 0x28,
    PrintScreen = 0x2C,
    Insert = 0x2D,
    Delete = 0x2E,

    // Top-row digits (VK_0 = 0x30 .. VK_9 = 0x39, same as ASCII)
    N0 = 0x30,
    N1 = 0x31,
    N2 = 0x32,
    N3 = 0x33,
    N4 = 0x34,
    N5 = 0x35,
    N6 = 0x36,
    N7 = 0x37,
    N8 = 0x38,
    N9 = 0x39,

    // Letters (VK_A = 0x41 .. VK_Z = 0x5A, same as ASCII uppercase)
    A = 0x41,
    B = 0x42,
    C = 0x43,
    D = 0x44,
    E = 0x45,
    F = 0x46,
    G = 0x47,
    H = 0x48,
    I = 0x49,
    J = 0x4A,
    K = 0x4B,
    L = 0x4C,
    M = 0x4D,
    N = 0x4E,
    O = 0x4F,
    P = 0x50,
    Q = 0x51,
    R = 0x52,
    S = 0x53,
    T = 0x54,
    U = 0x55,
    V = 0x56,
    W = 0x57,
    X = 0x58,
    Y = 0x59,
    Z = 0x5A,

    LeftWindows = 0x5B,
    RightWindows = 0x5C,
    Application = 0x5D,

    // Numeric keypad
    Numpad0 = 0x60,
    Numpad1 = 0x61,
    Numpad2 = 0x62,
    Numpad3 = 0x63,
    Numpad4 = 0x64,
    Numpad5 = 0x65,
    Numpad6 = 0x66,
    Numpad7 = 0x67,
    Numpad8 = 0x68,
    Numpad9 = 0x69,
    Multiply = 0x6A,
    Add = 0x6B,
    Separator = 0x6C,
    Subtract = 0x6D,
    Decimal = 0x6E,
    Divide = 0x6F,

    // Function keys
    F1 = 0x70,
    F2 = 0x71,
    F3 = 0x72,
    F4 = 0x73,
    F5 = 0x74,
    F6 = 0x75,
    F7 = 0x76,
    F8 = 0x77,
    F9 = 0x78,
    F10 = 0x79,
    F11 = 0x7A,
    F12 = 0x7B,
    F13 = 0x7C,
    F14 = 0x7D,
    F15 = 0x7E,
    F16 = 0x7F,
    F17 = 0x80,
    F18 = 0x81,
    F19 = 0x82,
    F20 = 0x83,
    F21 = 0x84,
    F22 = 0x85,
    F23 = 0x86,
    F24 = 0x87,

    // Lock keys
    NumLock = 0x90,
    ScrollLock = 0x91,

    // Side-specific modifiers
    LeftShift = 0xA0,
    RightShift = 0xA1,
    LeftControl = 0xA2,
    RightControl = 0xA3,
    LeftMenu = 0xA4,
    RightMenu = 0xA5,

    // Punctuation / symbol keys (OEM codes, ANSI layout assumed)
    OEM1 = 0xBA,
    OEMPlus = 0xBB,
    OEMComma = 0xBC,
    OEMMinus = 0xBD,
    OEMPeriod = 0xBE,
    OEM2 = 0xBF,
    OEM3 = 0xC0,
    OEM4 = 0xDB,
    OEM5 = 0xDC,
    OEM6 = 0xDD,
    OEM7 = 0xDE,
    OEM8 = 0xDF,
    OEM102 = 0xE2,
}

impl RawKey {
    /// Looks up the name of a virtual-key code. `None` for unnamed codes.
    pub fn from_vk(vk: u16) -> Option<Self> {
        use RawKey::*;
        let key = match vk {
            0x01 => LeftButton,
            0x02 => RightButton,
            0x03 => Cancel,
            0x04 => MiddleButton,
            0x05 => ExtraButton1,
            0x06 => ExtraButton2,

            0x08 => Back,
            0x09 => Tab,
            0x0C => Clear,
            0x0D => Return,
            0x10 => Shift,
            0x11 => Control,
            0x12 => Menu,
            0x13 => Pause,
            0x14 => CapsLock,
            0x1B => Escape,
            0x20 => Space,

            0x21 => Prior,
            0x22 => Next,
            0x23 => End,
            0x24 => Home,
            0x25 => Left,
            0x26 => Up,
            0x27 => Right,
            0x28 => Down,
            0x2C => PrintScreen,
            0x2D => Insert,
            0x2E => Delete,

            0x30 => N0,
            0x31 => N1,
            0x32 => N2,
            0x33 => N3,
            0x34 => N4,
            0x35 => N5,
            0x36 => N6,
            0x37 => N7,
            0x38 => N8,
            0x39 => N9,

            0x41 => A,
            0x42 => B,
            0x43 => C,
            0x44 => D,
            0x45 => E,
            0x46 => F,
            0x47 => G,
            0x48 => H,
            0x49 => I,
            0x4A => J,
            0x4B => K,
            0x4C => L,
            0x4D => M,
            0x4E => N,
            0x4F => O,
            0x50 => P,
            0x51 => Q,
            0x52 => R,
            0x53 => S,
            0x54 => T,
            0x55 => U,
            0x56 => V,
            0x57 => W,
            0x58 => X,
            0x59 => Y,
            0x5A => Z,

            0x5B => LeftWindows,
            0x5C => RightWindows,
            0x5D => Application,

            0x60 => Numpad0,
            0x61 => Numpad1,
            0x62 => Numpad2,
            0x63 => Numpad3,
            0x64 => Numpad4,
            0x65 => Numpad5,
            0x66 => Numpad6,
            0x67 => Numpad7,
            0x68 => Numpad8,
            0x69 => Numpad9,
            0x6A => Multiply,
            0x6B => Add,
            0x6C => Separator,
            0x6D => Subtract,
            0x6E => Decimal,
            0x6F => Divide,

            0x70 => F1,
            0x71 => F2,
            0x72 => F3,
            0x73 => F4,
            0x74 => F5,
            0x75 => F6,
            0x76 => F7,
            0x77 => F8,
            0x78 => F9,
            0x79 => F10,
            0x7A => F11,
            0x7B => F12,
            0x7C => F13,
            0x7D => F14,
            0x7E => F15,
            0x7F => F16,
            0x80 => F17,
            0x81 => F18,
            0x82 => F19,
            0x83 => F20,
            0x84 => F21,
            0x85 => F22,
            0x86 => F23,
            0x87 => F24,

            0x90 => NumLock,
            0x91 => ScrollLock,

            0xA0 => LeftShift,
            0xA1 => RightShift,
            0xA2 => LeftControl,
            0xA3 => RightControl,
            0xA4 => LeftMenu,
            0xA5 => RightMenu,

            0xBA => OEM1,
            0xBB => OEMPlus,
            0xBC => OEMComma,
            0xBD => OEMMinus,
            0xBE => OEMPeriod,
            0xBF => OEM2,
            0xC0 => OEM3,
            0xDB => OEM4,
            0xDC => OEM5,
            0xDD => OEM6,
            0xDE => OEM7,
            0xDF => OEM8,
            0xE2 => OEM102,

            _ => return None,
        };
        Some(key)
    }

    pub fn vk(self) -> u16 {
        self as u16
    }

    /// Shift, Control, Alt or Windows, either side or sideless.
    pub fn is_modifier(self) -> bool {
        use RawKey::*;
        matches!(
            self,
            Shift
                | Control
                | Menu
                | LeftShift
                | RightShift
                | LeftControl
                | RightControl
                | LeftMenu
                | RightMenu
                | LeftWindows
                | RightWindows
        )
    }
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Formats a virtual-key code for logs: the name when known, hex otherwise.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn describe_vk(vk: u16) -> String {
    match RawKey::from_vk(vk) {
        Some(key) => format!("{key} ({vk:#04x})"),
        None => format!("{vk:#04x}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
