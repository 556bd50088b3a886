//! Parsing and formatting of global hotkey bindings.
//!
//! Bindings are written as `"win+d"` or `"ctrl+alt+f4"`: any number of
//! modifiers followed by a single key name. Keys carry their virtual-key
//! code so the host can hand them straight to the OS registration call.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const SHIFT: Modifiers = Modifiers(0b0001);
    pub const CONTROL: Modifiers = Modifiers(0b0010);
    pub const ALT: Modifiers = Modifiers(0b0100);
    pub const WIN: Modifiers = Modifiers(0b1000);

    pub fn empty() -> Modifiers {
        Modifiers(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (bits, name) in [
            (Modifiers::WIN, "win"),
            (Modifiers::CONTROL, "ctrl"),
            (Modifiers::ALT, "alt"),
            (Modifiers::SHIFT, "shift"),
        ] {
            if self.contains(bits) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

fn modifier_from_name(name: &str) -> Option<Modifiers> {
    match name {
        "shift" => Some(Modifiers::SHIFT),
        "ctrl" | "control" => Some(Modifiers::CONTROL),
        "alt" => Some(Modifiers::ALT),
        "win" | "super" | "meta" => Some(Modifiers::WIN),
        _ => None,
    }
}

/// Virtual-key code of the non-modifier key in a binding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const TAB: KeyCode = KeyCode(0x09);
    pub const ENTER: KeyCode = KeyCode(0x0d);
    pub const ESCAPE: KeyCode = KeyCode(0x1b);
    pub const SPACE: KeyCode = KeyCode(0x20);
    pub const DELETE: KeyCode = KeyCode(0x2e);

    fn from_name(name: &str) -> Option<KeyCode> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return match c {
                'a'..='z' => Some(KeyCode(c as u32 - 'a' as u32 + 0x41)),
                '0'..='9' => Some(KeyCode(c as u32 - '0' as u32 + 0x30)),
                _ => None,
            };
        }
        if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
            if (1..=12).contains(&n) {
                return Some(KeyCode(0x70 + n - 1));
            }
            return None;
        }
        match name {
            "tab" => Some(KeyCode::TAB),
            "enter" | "return" => Some(KeyCode::ENTER),
            "esc" | "escape" => Some(KeyCode::ESCAPE),
            "space" => Some(KeyCode::SPACE),
            "del" | "delete" => Some(KeyCode::DELETE),
            _ => None,
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0x41..=0x5a => write!(f, "{}", (self.0 as u8 + b'a' - b'A') as char),
            0x30..=0x39 => write!(f, "{}", (self.0 as u8) as char),
            0x70..=0x7b => write!(f, "f{}", self.0 - 0x70 + 1),
            0x09 => f.write_str("tab"),
            0x0d => f.write_str("enter"),
            0x1b => f.write_str("escape"),
            0x20 => f.write_str("space"),
            0x2e => f.write_str("delete"),
            other => write!(f, "vk{other:#04x}"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HotkeySpec {
    pub modifiers: Modifiers,
    pub key: KeyCode,
}

impl FromStr for HotkeySpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::empty();
        let mut key = None;
        for part in s.split('+') {
            let part = part.trim().to_ascii_lowercase();
            if part.is_empty() {
                bail!("empty component in hotkey {s:?}");
            }
            if let Some(modifier) = modifier_from_name(&part) {
                modifiers.insert(modifier);
            } else if let Some(code) = KeyCode::from_name(&part) {
                if key.replace(code).is_some() {
                    bail!("hotkey {s:?} names more than one key");
                }
            } else {
                bail!("unknown key {part:?} in hotkey {s:?}");
            }
        }
        let Some(key) = key else {
            bail!("hotkey {s:?} has no key");
        };
        Ok(HotkeySpec { modifiers, key })
    }
}

impl fmt::Display for HotkeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

impl Serialize for HotkeySpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HotkeySpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
