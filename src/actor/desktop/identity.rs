//! Shell-window identity: registration, activation defense, close policy.
//!
//! The desktop window is meant to live for the whole session. Registration
//! as the OS shell window is best-effort and re-asserted whenever another
//! process looks like it stole the role.

use tracing::{info, warn};

use crate::common::config::DesktopSettings;
use crate::sys::shell::{ShellOps, WindowHandle};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CloseDecision {
    /// Session shutdown: let the window close and hand the desktop back to
    /// the OS.
    AllowAndRestoreDesktopIcons,
    /// Alt+F4: keep the window and ask about shutting down instead.
    CancelAndConfirmShutdown,
    /// The desktop window never closes during normal operation.
    Cancel,
}

#[derive(Debug, Default)]
pub struct ShellIdentity {
    registered: bool,
    hotkey_registered: bool,
}

impl ShellIdentity {
    pub fn on_created(
        &mut self,
        ops: &dyn ShellOps,
        handle: WindowHandle,
        settings: &DesktopSettings,
    ) {
        ops.hide_from_task_switcher(handle);
        self.register(ops, handle);
        self.update_hotkey(ops, settings);
    }

    /// Another process may have claimed shell-window status; take it back
    /// whenever we are activated while not topmost.
    pub fn on_activated(&mut self, ops: &dyn ShellOps, handle: WindowHandle, topmost: bool) {
        if topmost {
            return;
        }
        self.register(ops, handle);
        ops.show_bottom_most(handle);
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    fn register(&mut self, ops: &dyn ShellOps, handle: WindowHandle) {
        match ops.set_shell_window(handle) {
            Ok(()) => {
                self.registered = true;
                info!("registered as the session shell window");
            }
            Err(err) => {
                self.registered = false;
                warn!("shell window registration failed: {err}; continuing unregistered");
            }
        }
    }

    pub fn update_hotkey(&mut self, ops: &dyn ShellOps, settings: &DesktopSettings) {
        if self.hotkey_registered {
            ops.unregister_overlay_hotkey();
            self.hotkey_registered = false;
        }
        if !settings.overlay_hotkey_enabled {
            return;
        }
        match ops.register_overlay_hotkey(&settings.overlay_hotkey) {
            Ok(()) => self.hotkey_registered = true,
            Err(err) => warn!(
                "failed to register overlay hotkey {}: {err}",
                settings.overlay_hotkey
            ),
        }
    }

    pub fn close_decision(&self, shutting_down: bool, alt_f4: bool) -> CloseDecision {
        if shutting_down {
            CloseDecision::AllowAndRestoreDesktopIcons
        } else if alt_f4 {
            CloseDecision::CancelAndConfirmShutdown
        } else {
            CloseDecision::Cancel
        }
    }
}
