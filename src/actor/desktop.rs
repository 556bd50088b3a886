//! The desktop window actor: shell identity, overlay mode, and message
//! interception for the desktop surface.
//!
//! All state lives on the interactive thread. The host calls
//! [`Desktop::window_message`] synchronously from its window procedure and
//! [`Desktop::close_requested`] from its close handler; everything else
//! arrives as [`DesktopEvent`]s on the actor channel.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

pub mod identity;
pub mod interceptor;
pub mod overlay;

#[cfg(test)]
mod tests;

use self::identity::{CloseDecision, ShellIdentity};
use self::interceptor::{DesktopView, Effect, Intercept, Verdict};
use self::overlay::{CLOSED_TINT, OPEN_TINT, Overlay, Transition};
use crate::actor;
use crate::actor::broadcast::{BroadcastSender, ShellEvent};
use crate::common::config::{Config, DesktopSettings};
use crate::sys::background::{BackgroundCache, BackgroundRenderer};
use crate::sys::geometry::{Size, desktop_bounds};
use crate::sys::shell::{ShellOps, WindowHandle};
use crate::sys::winmsg::{RawMessage, WindowMessage, WindowPos};

pub type Sender = actor::Sender<DesktopEvent>;
pub type Receiver = actor::Receiver<DesktopEvent>;

#[derive(Debug)]
pub enum DesktopEvent {
    /// The host created the native desktop window; `display` is the
    /// current display size.
    WindowCreated { handle: WindowHandle, display: Size },
    /// The desktop window became the active window.
    Activated,
    /// The host received a close request for the desktop window.
    CloseRequested,
    /// The registered overlay hotkey fired.
    HotkeyPressed,
    SetOverlay(bool),
    ToggleOverlay,
    /// A modal file-browse dialog opened or closed over the desktop.
    FileDialogOpened,
    FileDialogClosed,
    /// The session is ending; the next close request will be allowed.
    ShuttingDown,
    /// A raw message forwarded through the channel; replies are dropped, so
    /// hosts that need the verdict call `window_message` directly.
    Message(RawMessage),
    ConfigUpdated(Box<Config>),
}

/// What the host's window procedure should do with a message.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct MessageReply {
    pub verdict: Verdict,
    /// Rewritten position block to copy back into the message payload.
    pub rewrite: Option<WindowPos>,
}

pub struct Desktop {
    settings: DesktopSettings,
    ops: Arc<dyn ShellOps>,
    renderer: Box<dyn BackgroundRenderer>,
    background: BackgroundCache,
    overlay: Overlay,
    identity: ShellIdentity,
    broadcast_tx: BroadcastSender,
    receiver: Receiver,
    handle: Option<WindowHandle>,
    display: Size,
    topmost: bool,
    file_dialog_open: bool,
    alt_f4_pressed: bool,
    shutting_down: bool,
}

impl Desktop {
    pub fn new(
        settings: DesktopSettings,
        ops: Arc<dyn ShellOps>,
        renderer: Box<dyn BackgroundRenderer>,
        broadcast_tx: BroadcastSender,
    ) -> (Self, Sender) {
        let (sender, receiver) = actor::channel();
        let this = Self {
            settings,
            ops,
            renderer,
            background: BackgroundCache::default(),
            overlay: Overlay::default(),
            identity: ShellIdentity::default(),
            broadcast_tx,
            receiver,
            handle: None,
            display: Size::default(),
            topmost: false,
            file_dialog_open: false,
            alt_f4_pressed: false,
            shutting_down: false,
        };
        (this, sender)
    }

    pub async fn run(mut self) {
        while let Some((span, event)) = self.receiver.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
            if self.shutting_down {
                info!("desktop actor exiting");
                break;
            }
        }
    }

    #[instrument(name = "desktop::handle_event", skip(self))]
    pub fn handle_event(&mut self, event: DesktopEvent) {
        use DesktopEvent::*;
        match event {
            WindowCreated { handle, display } => self.window_created(handle, display),
            Activated => self.activated(),
            CloseRequested => {
                let _ = self.close_requested();
            }
            HotkeyPressed | ToggleOverlay => self.toggle_overlay(),
            SetOverlay(open) => self.set_overlay(open),
            FileDialogOpened => self.file_dialog_open = true,
            FileDialogClosed => self.file_dialog_open = false,
            ShuttingDown => self.shutting_down = true,
            Message(raw) => {
                let _ = self.window_message(WindowMessage::decode(raw, None));
            }
            ConfigUpdated(config) => self.config_updated(*config),
        }
    }

    /// Entry point for the host's window procedure. Interception effects
    /// are applied inline; the reply tells the host whether the message was
    /// handled and what to write back.
    pub fn window_message(&mut self, message: WindowMessage) -> MessageReply {
        let view = DesktopView {
            overlay_open: self.overlay.is_open(),
            file_dialog_open: self.file_dialog_open,
            is_primary_shell: self.settings.run_as_shell,
        };
        let Intercept { verdict, effects, rewrite } = interceptor::intercept(&view, &message);
        for effect in effects {
            self.apply_effect(effect);
        }
        MessageReply { verdict, rewrite }
    }

    /// Close policy for the host's close handler; see
    /// [`identity::CloseDecision`]. The Alt+F4 flag is consumed here.
    pub fn close_requested(&mut self) -> CloseDecision {
        let alt_f4 = std::mem::take(&mut self.alt_f4_pressed);
        let decision = self.identity.close_decision(self.shutting_down, alt_f4);
        match decision {
            CloseDecision::AllowAndRestoreDesktopIcons => {
                self.ops.set_desktop_icons_visible(true);
            }
            CloseDecision::CancelAndConfirmShutdown => {
                self.ops.show_shutdown_confirmation();
            }
            CloseDecision::Cancel => {}
        }
        decision
    }

    pub fn overlay_open(&self) -> bool {
        self.overlay.is_open()
    }

    pub fn toggle_overlay(&mut self) {
        let open = !self.overlay.is_open();
        self.set_overlay(open);
    }

    pub fn set_overlay(&mut self, open: bool) {
        let Some(handle) = self.handle else {
            debug!("overlay toggle before window creation; ignoring");
            return;
        };
        let Some(transition) = self.overlay.set(open) else {
            return;
        };
        match transition {
            Transition::Opened => {
                self.topmost = true;
                self.ops.set_topmost(handle, true);
                self.ops.set_foreground(handle);
                self.ops.set_tint(handle, OPEN_TINT);
                self.ops.set_background(handle, None);
            }
            Transition::Closed => {
                self.topmost = false;
                self.ops.set_topmost(handle, false);
                self.ops.show_bottom_most(handle);
                self.ops.set_tint(handle, CLOSED_TINT);
                self.repaint_background();
            }
        }
        self.broadcast_tx.send(ShellEvent::OverlayChanged { open });
    }

    fn window_created(&mut self, handle: WindowHandle, display: Size) {
        if self.handle.is_some() {
            warn!("desktop window already created; ignoring");
            return;
        }
        self.handle = Some(handle);
        self.display = display;
        self.identity.on_created(&*self.ops, handle, &self.settings);
        self.ops.set_bounds(handle, desktop_bounds(display));
        self.ops.set_tint(handle, CLOSED_TINT);
        self.repaint_background();
    }

    fn activated(&mut self) {
        let Some(handle) = self.handle else {
            return;
        };
        self.identity.on_activated(&*self.ops, handle, self.topmost);
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AssertBottomMost => {
                if let Some(handle) = self.handle {
                    self.ops.show_bottom_most(handle);
                }
            }
            Effect::ResizeToDisplay(display) => {
                self.display = display;
                if let Some(handle) = self.handle {
                    self.ops.set_bounds(handle, desktop_bounds(display));
                }
            }
            Effect::RefreshBackground => {
                self.background.invalidate();
                self.repaint_background();
            }
            Effect::NoteAltF4 => self.alt_f4_pressed = true,
        }
    }

    fn repaint_background(&mut self) {
        let Some(handle) = self.handle else {
            return;
        };
        // Painting is suppressed while the overlay is open; the close
        // transition repaints.
        if self.overlay.is_open() {
            return;
        }
        // When another shell owns the session, the OS paints the desktop.
        if !self.settings.run_as_shell {
            return;
        }
        let surface = self
            .background
            .ensure(&*self.renderer, &self.settings.background, self.display)
            .clone();
        self.ops.set_background(handle, Some(&surface));
    }

    fn config_updated(&mut self, config: Config) {
        let background_changed = config.desktop.background != self.settings.background;
        let hotkey_changed = config.desktop.overlay_hotkey != self.settings.overlay_hotkey
            || config.desktop.overlay_hotkey_enabled != self.settings.overlay_hotkey_enabled;
        self.settings = config.desktop;

        if hotkey_changed {
            debug!("overlay hotkey binding changed; re-registering");
            self.identity.update_hotkey(&*self.ops, &self.settings);
        }
        if background_changed {
            debug!("background configuration changed; repainting");
            self.background.invalidate();
            self.repaint_background();
        }
    }
}
