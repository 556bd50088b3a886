//! Classification of raw window-procedure messages.
//!
//! The host forwards every message aimed at the desktop window; only the
//! handful of ids below carry meaning for the shell. Pointer payloads (the
//! pending position block of a position-changing message) are decoded by
//! the host and passed by value.

use num_enum::TryFromPrimitive;

use crate::sys::geometry::Size;

/// Mouse-activate return value: do not activate the window.
pub const MA_NOACTIVATE: isize = 3;
/// wParam of a setting-change message that targets the desktop wallpaper.
pub const SPI_SETDESKWALLPAPER: usize = 0x0014;
pub const VK_F4: u32 = 0x73;
/// lParam bit set on system-key messages while Alt is held.
const CONTEXT_CODE: isize = 1 << 29;

#[derive(TryFromPrimitive, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum KnownMessage {
    FocusGained = 0x0007,
    SettingChange = 0x001a,
    MouseActivate = 0x0021,
    PositionChanging = 0x0046,
    PositionChanged = 0x0047,
    DisplayChange = 0x007e,
    SysKeyDown = 0x0104,
}

bitflags::bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct WindowPosFlags: u32 {
        const NO_SIZE = 0x0001;
        const NO_MOVE = 0x0002;
        const NO_Z_ORDER = 0x0004;
        const NO_REDRAW = 0x0008;
        const NO_ACTIVATE = 0x0010;
        const FRAME_CHANGED = 0x0020;
        const SHOW_WINDOW = 0x0040;
        const HIDE_WINDOW = 0x0080;
        const NO_OWNER_Z_ORDER = 0x0200;
    }
}

/// Pending window-position change carried by a position-changing message.
/// If interception returns a rewritten copy, the host writes it back into
/// the message payload before the default handling runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WindowPos {
    pub insert_after: isize,
    pub x: i32,
    pub y: i32,
    pub cx: i32,
    pub cy: i32,
    pub flags: WindowPosFlags,
}

impl WindowPos {
    pub fn suppresses_z_order(&self) -> bool {
        self.flags.contains(WindowPosFlags::NO_Z_ORDER)
    }

    pub fn with_z_order_suppressed(mut self) -> WindowPos {
        self.flags |= WindowPosFlags::NO_Z_ORDER;
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub msg: u32,
    pub wparam: usize,
    pub lparam: isize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WindowMessage {
    MouseActivate,
    FocusGained,
    PositionChanged,
    PositionChanging(WindowPos),
    /// Display geometry changed; carries the new display size.
    DisplayChange(Size),
    /// System-wide setting change for the desktop wallpaper specifically.
    WallpaperChanged,
    /// Any other system-wide setting change; carries the parameter id.
    SettingChange(usize),
    SysKeyDown { vk: u32, alt_held: bool },
    Other(u32),
}

impl WindowMessage {
    /// Classify a raw message. `pos` is the decoded payload of a
    /// position-changing message; without it that message stays opaque.
    pub fn decode(raw: RawMessage, pos: Option<WindowPos>) -> WindowMessage {
        match KnownMessage::try_from(raw.msg) {
            Ok(KnownMessage::MouseActivate) => WindowMessage::MouseActivate,
            Ok(KnownMessage::FocusGained) => WindowMessage::FocusGained,
            Ok(KnownMessage::PositionChanged) => WindowMessage::PositionChanged,
            Ok(KnownMessage::PositionChanging) => match pos {
                Some(pos) => WindowMessage::PositionChanging(pos),
                None => WindowMessage::Other(raw.msg),
            },
            Ok(KnownMessage::DisplayChange) => {
                let packed = raw.lparam as u32;
                WindowMessage::DisplayChange(Size::new(
                    (packed & 0xffff) as i32,
                    (packed >> 16) as i32,
                ))
            }
            Ok(KnownMessage::SettingChange) if raw.wparam == SPI_SETDESKWALLPAPER => {
                WindowMessage::WallpaperChanged
            }
            Ok(KnownMessage::SettingChange) => WindowMessage::SettingChange(raw.wparam),
            Ok(KnownMessage::SysKeyDown) => WindowMessage::SysKeyDown {
                vk: raw.wparam as u32,
                alt_held: raw.lparam & CONTEXT_CODE != 0,
            },
            Err(_) => WindowMessage::Other(raw.msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn decodes_display_change_geometry() {
        let raw = RawMessage {
            msg: KnownMessage::DisplayChange as u32,
            wparam: 32,
            lparam: (1080 << 16) | 1920,
        };
        assert_eq!(
            WindowMessage::decode(raw, None),
            WindowMessage::DisplayChange(Size::new(1920, 1080))
        );
    }

    #[test]
    fn distinguishes_wallpaper_setting_changes() {
        let wallpaper = RawMessage {
            msg: KnownMessage::SettingChange as u32,
            wparam: SPI_SETDESKWALLPAPER,
            lparam: 0,
        };
        assert_eq!(WindowMessage::decode(wallpaper, None), WindowMessage::WallpaperChanged);

        let other = RawMessage {
            msg: KnownMessage::SettingChange as u32,
            wparam: 0x002a,
            lparam: 0,
        };
        assert_eq!(WindowMessage::decode(other, None), WindowMessage::SettingChange(0x002a));
    }

    #[test]
    fn decodes_alt_f4_context_code() {
        let raw = RawMessage {
            msg: KnownMessage::SysKeyDown as u32,
            wparam: VK_F4 as usize,
            lparam: 1 << 29,
        };
        assert_eq!(
            WindowMessage::decode(raw, None),
            WindowMessage::SysKeyDown { vk: VK_F4, alt_held: true }
        );
    }

    #[test]
    fn position_changing_without_payload_stays_opaque() {
        let raw = RawMessage {
            msg: KnownMessage::PositionChanging as u32,
            wparam: 0,
            lparam: 0,
        };
        assert_eq!(
            WindowMessage::decode(raw, None),
            WindowMessage::Other(KnownMessage::PositionChanging as u32)
        );
    }

    #[test]
    fn z_order_suppression_is_sticky() {
        let pos = WindowPos {
            insert_after: 0,
            x: 0,
            y: 0,
            cx: 100,
            cy: 100,
            flags: WindowPosFlags::NO_MOVE,
        };
        assert!(!pos.suppresses_z_order());
        let rewritten = pos.with_z_order_suppressed();
        assert!(rewritten.suppresses_z_order());
        assert!(rewritten.flags.contains(WindowPosFlags::NO_MOVE));
    }
}
