//! Desktop overlay ("peek") mode: a two-state machine with synchronous,
//! idempotent transitions. Entry actions are executed by the desktop actor.

use crate::common::config::Color;

/// Tint drawn over the desktop content while the overlay is open.
pub const OPEN_TINT: Color = Color::argb(0x88, 0x00, 0x00, 0x00);
/// Near-invisible, but non-null so the surface keeps receiving hit tests.
pub const CLOSED_TINT: Color = Color::argb(0x01, 0x00, 0x00, 0x00);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OverlayState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transition {
    Opened,
    Closed,
}

#[derive(Debug, Default)]
pub struct Overlay {
    state: OverlayState,
}

impl Overlay {
    pub fn is_open(&self) -> bool {
        self.state == OverlayState::Open
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    /// Returns the transition to apply, or `None` when already in the
    /// requested state.
    pub fn set(&mut self, open: bool) -> Option<Transition> {
        match (self.state, open) {
            (OverlayState::Closed, true) => {
                self.state = OverlayState::Open;
                Some(Transition::Opened)
            }
            (OverlayState::Open, false) => {
                self.state = OverlayState::Closed;
                Some(Transition::Closed)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_idempotent() {
        let mut overlay = Overlay::default();
        assert_eq!(overlay.set(false), None);
        assert_eq!(overlay.set(true), Some(Transition::Opened));
        assert_eq!(overlay.set(true), None);
        assert_eq!(overlay.set(false), Some(Transition::Closed));
        assert_eq!(overlay.set(false), None);
        assert!(!overlay.is_open());
    }
}
