//! Timed input events.
//!
//! A `TimedEvent` is an immutable record of one input occurrence stamped
//! with a monotonic timestamp. Buttons and keys are normalized to closed
//! enums at the capture boundary; unrecognized raw input degrades with a
//! warning instead of failing a session.

use std::fmt;

use tracing::warn;

/// A pointer button, normalized at capture time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }

    /// Interpret a raw button description.
    ///
    /// Accepts the plain names written by [`as_str`](Self::as_str) as well
    /// as qualified forms such as `Button.left` found in older tapes.
    /// Unrecognized descriptions fall back to `Left` with a warning.
    pub fn parse(raw: &str) -> MouseButton {
        let lower = raw.to_ascii_lowercase();
        if lower.contains("left") {
            MouseButton::Left
        } else if lower.contains("right") {
            MouseButton::Right
        } else if lower.contains("middle") {
            MouseButton::Middle
        } else {
            warn!(button = raw, "unrecognized mouse button, defaulting to left");
            MouseButton::Left
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! named_keys {
    ($(($variant:ident, $name:literal)),+ $(,)?) => {
        /// A symbolic (non-character) key.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum NamedKey {
            $($variant),+
        }

        impl NamedKey {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(NamedKey::$variant => $name),+
                }
            }

            pub fn from_name(name: &str) -> Option<NamedKey> {
                match name {
                    $($name => Some(NamedKey::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

named_keys! {
    (Alt, "alt"),
    (AltGr, "alt_gr"),
    (AltR, "alt_r"),
    (Backspace, "backspace"),
    (CapsLock, "caps_lock"),
    (Cmd, "cmd"),
    (CmdR, "cmd_r"),
    (Ctrl, "ctrl"),
    (CtrlR, "ctrl_r"),
    (Delete, "delete"),
    (Down, "down"),
    (End, "end"),
    (Enter, "enter"),
    (Esc, "esc"),
    (F1, "f1"),
    (F2, "f2"),
    (F3, "f3"),
    (F4, "f4"),
    (F5, "f5"),
    (F6, "f6"),
    (F7, "f7"),
    (F8, "f8"),
    (F9, "f9"),
    (F10, "f10"),
    (F11, "f11"),
    (F12, "f12"),
    (Home, "home"),
    (Insert, "insert"),
    (Left, "left"),
    (Menu, "menu"),
    (NumLock, "num_lock"),
    (PageDown, "page_down"),
    (PageUp, "page_up"),
    (Pause, "pause"),
    (PrintScreen, "print_screen"),
    (Right, "right"),
    (ScrollLock, "scroll_lock"),
    (Shift, "shift"),
    (ShiftR, "shift_r"),
    (Space, "space"),
    (Tab, "tab"),
    (Up, "up"),
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key identity: either a named symbolic key or a literal character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyId {
    Named(NamedKey),
    Char(char),
}

impl KeyId {
    /// Interpret a raw key description.
    ///
    /// Accepts named-key names (`shift`, `f6`), qualified forms such as
    /// `Key.shift` found in older tapes, and single characters with or
    /// without surrounding quotes (`a`, `'a'`). Returns `None` when the
    /// description names no known key.
    pub fn parse(raw: &str) -> Option<KeyId> {
        let raw = raw.trim();
        if let Some(name) = raw.strip_prefix("Key.") {
            return NamedKey::from_name(name).map(KeyId::Named);
        }
        if let Some(named) = NamedKey::from_name(raw) {
            return Some(KeyId::Named(named));
        }
        let literal = raw.trim_matches(|c| c == '\'' || c == '"');
        let mut chars = literal.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeyId::Char(c)),
            _ => None,
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::Named(named) => f.write_str(named.as_str()),
            KeyId::Char(c) => write!(f, "{c}"),
        }
    }
}

/// One captured input occurrence.
///
/// The timestamp is a monotonic-clock reading in seconds taken at the
/// moment the raw notification fired; events are never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimedEvent {
    /// Pointer moved to an absolute position.
    MouseMove { time: f64, x: i32, y: i32 },
    /// Pointer button pressed or released at a position.
    MouseClick {
        time: f64,
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    },
    /// Key pressed or released.
    Keyboard {
        time: f64,
        key: KeyId,
        pressed: bool,
    },
}

impl TimedEvent {
    /// Capture timestamp in monotonic seconds.
    pub fn time(&self) -> f64 {
        match self {
            TimedEvent::MouseMove { time, .. }
            | TimedEvent::MouseClick { time, .. }
            | TimedEvent::Keyboard { time, .. } => *time,
        }
    }

    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            TimedEvent::MouseMove { .. } | TimedEvent::MouseClick { .. }
        )
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(self, TimedEvent::Keyboard { .. })
    }
}
