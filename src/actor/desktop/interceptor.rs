//! Window-procedure interception for the desktop window.
//!
//! Decisions are pure: the current view of the desktop plus one message map
//! to a verdict and a closed set of side effects. The desktop actor
//! executes the effects; the host consumes the verdict and any rewritten
//! position block.

use crate::sys::geometry::Size;
use crate::sys::winmsg::{MA_NOACTIVATE, VK_F4, WindowMessage, WindowPos};

/// The slice of desktop state interception depends on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DesktopView {
    pub overlay_open: bool,
    pub file_dialog_open: bool,
    pub is_primary_shell: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    NotHandled,
    Handled(isize),
}

impl Verdict {
    pub fn is_handled(&self) -> bool {
        matches!(self, Verdict::Handled(_))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Push the desktop window back to the bottom of the z-order.
    AssertBottomMost,
    /// The display geometry changed; re-fit the window to it.
    ResizeToDisplay(Size),
    /// Drop the cached background and paint a fresh one.
    RefreshBackground,
    /// Remember that Alt+F4 produced the next close request.
    NoteAltF4,
}

#[derive(Debug, PartialEq, Eq, Default)]
pub struct Intercept {
    pub verdict: Verdict,
    pub effects: Vec<Effect>,
    /// Rewritten position block the host must write back into the message.
    pub rewrite: Option<WindowPos>,
}

impl Intercept {
    fn unhandled() -> Intercept {
        Intercept::default()
    }

    fn handled(result: isize) -> Intercept {
        Intercept {
            verdict: Verdict::Handled(result),
            ..Intercept::default()
        }
    }
}

pub fn intercept(view: &DesktopView, message: &WindowMessage) -> Intercept {
    match message {
        // Never steal focus on mouse interaction.
        WindowMessage::MouseActivate => Intercept::handled(MA_NOACTIVATE),

        WindowMessage::FocusGained | WindowMessage::PositionChanged => {
            let mut out = Intercept::unhandled();
            // The OS keeps trying to raise the desktop window; push back
            // every single time.
            if !view.overlay_open && !view.file_dialog_open {
                out.effects.push(Effect::AssertBottomMost);
            }
            out
        }

        WindowMessage::PositionChanging(pos) => {
            let mut out = Intercept::handled(MA_NOACTIVATE);
            // Let a modal file dialog come to the front without dragging
            // the desktop up with it.
            if view.file_dialog_open && !pos.suppresses_z_order() {
                out.rewrite = Some(pos.with_z_order_suppressed());
            }
            out
        }

        WindowMessage::DisplayChange(size) if view.is_primary_shell => Intercept {
            verdict: Verdict::Handled(0),
            effects: vec![Effect::ResizeToDisplay(*size), Effect::RefreshBackground],
            rewrite: None,
        },

        WindowMessage::WallpaperChanged => Intercept {
            verdict: Verdict::Handled(MA_NOACTIVATE),
            effects: vec![Effect::RefreshBackground],
            rewrite: None,
        },

        WindowMessage::SysKeyDown { vk: VK_F4, alt_held: true } => Intercept {
            verdict: Verdict::NotHandled,
            effects: vec![Effect::NoteAltF4],
            rewrite: None,
        },

        _ => Intercept::unhandled(),
    }
}
