//! The native shell-operation boundary.
//!
//! Every z-order, identity, and paint action the engine decides on is
//! executed by the platform host through [`ShellOps`]. All operations are
//! best-effort: the desktop window must survive any native failure.

use std::num::NonZeroIsize;

use tracing::debug;

use crate::common::config::Color;
use crate::sys::background::Surface;
use crate::sys::geometry::Rect;
use crate::sys::hotkey::HotkeySpec;

/// Native handle of a top-level window. Zero is never a valid handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WindowHandle(NonZeroIsize);

impl WindowHandle {
    pub fn new(raw: isize) -> Option<WindowHandle> {
        NonZeroIsize::new(raw).map(WindowHandle)
    }

    pub fn as_raw(self) -> isize {
        self.0.get()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ShellError {
    #[error("native call failed (code {0})")]
    Native(i32),
    #[error("not supported by this host")]
    Unsupported,
}

pub trait ShellOps {
    /// Push the window to the bottom of the z-order without activating it.
    fn show_bottom_most(&self, window: WindowHandle);
    fn set_topmost(&self, window: WindowHandle, topmost: bool);
    fn set_foreground(&self, window: WindowHandle);
    /// Register the window as the session's shell window. May be refused
    /// when another shell still holds the role.
    fn set_shell_window(&self, window: WindowHandle) -> Result<(), ShellError>;
    /// Exclude the window from the task switcher and task list.
    fn hide_from_task_switcher(&self, window: WindowHandle);
    /// Show or hide the OS-drawn desktop icons (used when handing the
    /// desktop back on shutdown).
    fn set_desktop_icons_visible(&self, visible: bool);
    fn set_bounds(&self, window: WindowHandle, bounds: Rect);
    /// Paint the desktop background; `None` suppresses painting entirely.
    fn set_background(&self, window: WindowHandle, surface: Option<&Surface>);
    /// Tint drawn over the desktop content layer.
    fn set_tint(&self, window: WindowHandle, tint: Color);
    fn register_overlay_hotkey(&self, hotkey: &HotkeySpec) -> Result<(), ShellError>;
    fn unregister_overlay_hotkey(&self);
    /// Ask the user whether to shut the session down. The outcome arrives
    /// out of band.
    fn show_shutdown_confirmation(&self);
}

/// Host stub that only logs. Used by tests and the headless development
/// binary; a real platform host replaces it.
#[derive(Debug, Default)]
pub struct NullShellOps;

impl ShellOps for NullShellOps {
    fn show_bottom_most(&self, window: WindowHandle) {
        debug!(?window, "show_bottom_most");
    }

    fn set_topmost(&self, window: WindowHandle, topmost: bool) {
        debug!(?window, topmost, "set_topmost");
    }

    fn set_foreground(&self, window: WindowHandle) {
        debug!(?window, "set_foreground");
    }

    fn set_shell_window(&self, window: WindowHandle) -> Result<(), ShellError> {
        debug!(?window, "set_shell_window");
        Ok(())
    }

    fn hide_from_task_switcher(&self, window: WindowHandle) {
        debug!(?window, "hide_from_task_switcher");
    }

    fn set_desktop_icons_visible(&self, visible: bool) {
        debug!(visible, "set_desktop_icons_visible");
    }

    fn set_bounds(&self, window: WindowHandle, bounds: Rect) {
        debug!(?window, ?bounds, "set_bounds");
    }

    fn set_background(&self, window: WindowHandle, surface: Option<&Surface>) {
        debug!(?window, ?surface, "set_background");
    }

    fn set_tint(&self, window: WindowHandle, tint: Color) {
        debug!(?window, %tint, "set_tint");
    }

    fn register_overlay_hotkey(&self, hotkey: &HotkeySpec) -> Result<(), ShellError> {
        debug!(%hotkey, "register_overlay_hotkey");
        Ok(())
    }

    fn unregister_overlay_hotkey(&self) {
        debug!("unregister_overlay_hotkey");
    }

    fn show_shutdown_confirmation(&self) {
        debug!("show_shutdown_confirmation");
    }
}
