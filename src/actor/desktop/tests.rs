use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use test_log::test;

use super::*;
use crate::actor::broadcast::BroadcastReceiver;
use crate::common::config::{BackgroundSettings, Color};
use crate::sys::background::{RenderError, Surface};
use crate::sys::geometry::Rect;
use crate::sys::hotkey::HotkeySpec;
use crate::sys::shell::ShellError;
use crate::sys::winmsg::{VK_F4, WindowPosFlags};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    BottomMost,
    Topmost(bool),
    Foreground,
    SetShellWindow,
    HideFromTasks,
    DesktopIcons(bool),
    SetBounds(Rect),
    Background(Option<Surface>),
    Tint(Color),
    RegisterHotkey,
    UnregisterHotkey,
    ShutdownPrompt,
}

#[derive(Default)]
struct RecordingShell {
    calls: StdMutex<Vec<Call>>,
}

impl RecordingShell {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

impl ShellOps for RecordingShell {
    fn show_bottom_most(&self, _window: WindowHandle) {
        self.record(Call::BottomMost);
    }

    fn set_topmost(&self, _window: WindowHandle, topmost: bool) {
        self.record(Call::Topmost(topmost));
    }

    fn set_foreground(&self, _window: WindowHandle) {
        self.record(Call::Foreground);
    }

    fn set_shell_window(&self, _window: WindowHandle) -> Result<(), ShellError> {
        self.record(Call::SetShellWindow);
        Ok(())
    }

    fn hide_from_task_switcher(&self, _window: WindowHandle) {
        self.record(Call::HideFromTasks);
    }

    fn set_desktop_icons_visible(&self, visible: bool) {
        self.record(Call::DesktopIcons(visible));
    }

    fn set_bounds(&self, _window: WindowHandle, bounds: Rect) {
        self.record(Call::SetBounds(bounds));
    }

    fn set_background(&self, _window: WindowHandle, surface: Option<&Surface>) {
        self.record(Call::Background(surface.cloned()));
    }

    fn set_tint(&self, _window: WindowHandle, tint: Color) {
        self.record(Call::Tint(tint));
    }

    fn register_overlay_hotkey(&self, _hotkey: &HotkeySpec) -> Result<(), ShellError> {
        self.record(Call::RegisterHotkey);
        Ok(())
    }

    fn unregister_overlay_hotkey(&self) {
        self.record(Call::UnregisterHotkey);
    }

    fn show_shutdown_confirmation(&self) {
        self.record(Call::ShutdownPrompt);
    }
}

#[derive(Default)]
struct CountingRenderer {
    renders: Arc<AtomicUsize>,
}

impl BackgroundRenderer for CountingRenderer {
    fn render(
        &self,
        settings: &BackgroundSettings,
        _bounds: Size,
    ) -> Result<Surface, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(Surface::Solid(settings.color))
    }
}

struct Fixture {
    desktop: Desktop,
    shell: Arc<RecordingShell>,
    renders: Arc<AtomicUsize>,
    broadcast_rx: BroadcastReceiver,
}

fn fixture() -> Fixture {
    fixture_with(DesktopSettings::default())
}

fn fixture_with(settings: DesktopSettings) -> Fixture {
    let shell = Arc::new(RecordingShell::default());
    let renders = Arc::new(AtomicUsize::new(0));
    let renderer = CountingRenderer { renders: renders.clone() };
    let (broadcast_tx, broadcast_rx) = actor::channel();
    let (desktop, _tx) = Desktop::new(settings, shell.clone(), Box::new(renderer), broadcast_tx);
    Fixture { desktop, shell, renders, broadcast_rx }
}

fn created(fixture: &mut Fixture) {
    fixture.desktop.handle_event(DesktopEvent::WindowCreated {
        handle: WindowHandle::new(0x10).unwrap(),
        display: Size::new(1920, 1080),
    });
    fixture.shell.take();
}

fn overlay_events(rx: &mut BroadcastReceiver) -> Vec<bool> {
    let mut out = Vec::new();
    while let Ok((_span, event)) = rx.try_recv() {
        if let ShellEvent::OverlayChanged { open } = event {
            out.push(open);
        }
    }
    out
}

#[test]
fn creation_establishes_shell_identity_and_background() {
    let mut f = fixture();
    f.desktop.handle_event(DesktopEvent::WindowCreated {
        handle: WindowHandle::new(0x10).unwrap(),
        display: Size::new(1920, 1080),
    });

    let calls = f.shell.take();
    assert_eq!(
        calls,
        vec![
            Call::HideFromTasks,
            Call::SetShellWindow,
            Call::SetBounds(Rect::new(0, 0, 1920, 1079)),
            Call::Tint(CLOSED_TINT),
            Call::Background(Some(Surface::Solid(
                BackgroundSettings::default().color
            ))),
        ]
    );
    assert_eq!(f.renders.load(Ordering::SeqCst), 1);
}

#[test]
fn overlay_transitions_are_idempotent_in_visible_state() {
    let mut f = fixture();
    created(&mut f);

    f.desktop.set_overlay(true);
    assert_eq!(
        f.shell.take(),
        vec![
            Call::Topmost(true),
            Call::Foreground,
            Call::Tint(OPEN_TINT),
            Call::Background(None),
        ]
    );

    // Opening again changes nothing visible.
    f.desktop.set_overlay(true);
    assert_eq!(f.shell.take(), vec![]);

    f.desktop.set_overlay(false);
    assert_eq!(
        f.shell.take(),
        vec![
            Call::Topmost(false),
            Call::BottomMost,
            Call::Tint(CLOSED_TINT),
            Call::Background(Some(Surface::Solid(BackgroundSettings::default().color))),
        ]
    );

    f.desktop.set_overlay(false);
    assert_eq!(f.shell.take(), vec![]);

    assert_eq!(overlay_events(&mut f.broadcast_rx), vec![true, false]);
}

#[test]
fn focus_gained_reasserts_bottom_most_only_while_closed() {
    let mut f = fixture();
    created(&mut f);

    let reply = f.desktop.window_message(WindowMessage::FocusGained);
    assert_eq!(reply.verdict, Verdict::NotHandled);
    assert_eq!(f.shell.take(), vec![Call::BottomMost]);

    f.desktop.set_overlay(true);
    f.shell.take();
    f.desktop.window_message(WindowMessage::FocusGained);
    assert_eq!(f.shell.take(), vec![]);
}

#[test]
fn file_dialog_suppresses_z_order_changes() {
    let mut f = fixture();
    created(&mut f);
    f.desktop.handle_event(DesktopEvent::FileDialogOpened);

    // No bottom-most fighting while the dialog is up.
    f.desktop.window_message(WindowMessage::PositionChanged);
    assert_eq!(f.shell.take(), vec![]);

    let pos = WindowPos {
        insert_after: 0,
        x: 0,
        y: 0,
        cx: 640,
        cy: 480,
        flags: WindowPosFlags::empty(),
    };
    let reply = f.desktop.window_message(WindowMessage::PositionChanging(pos));
    assert!(reply.verdict.is_handled());
    assert!(reply.rewrite.unwrap().suppresses_z_order());

    f.desktop.handle_event(DesktopEvent::FileDialogClosed);
    f.desktop.window_message(WindowMessage::PositionChanged);
    assert_eq!(f.shell.take(), vec![Call::BottomMost]);
}

#[test]
fn alt_f4_close_prompts_for_shutdown() {
    let mut f = fixture();
    created(&mut f);

    f.desktop.window_message(WindowMessage::SysKeyDown { vk: VK_F4, alt_held: true });
    let decision = f.desktop.close_requested();
    assert_eq!(decision, CloseDecision::CancelAndConfirmShutdown);
    assert_eq!(f.shell.take(), vec![Call::ShutdownPrompt]);

    // The flag is consumed: the next plain close is just cancelled.
    let decision = f.desktop.close_requested();
    assert_eq!(decision, CloseDecision::Cancel);
    assert_eq!(f.shell.take(), vec![]);
}

#[test]
fn shutdown_close_restores_desktop_icons() {
    let mut f = fixture();
    created(&mut f);

    f.desktop.handle_event(DesktopEvent::ShuttingDown);
    let decision = f.desktop.close_requested();
    assert_eq!(decision, CloseDecision::AllowAndRestoreDesktopIcons);
    assert_eq!(f.shell.take(), vec![Call::DesktopIcons(true)]);
}

#[test]
fn display_change_refits_window_and_repaints() {
    let mut f = fixture();
    created(&mut f);
    assert_eq!(f.renders.load(Ordering::SeqCst), 1);

    let reply = f.desktop.window_message(WindowMessage::DisplayChange(Size::new(2560, 1440)));
    assert_eq!(reply.verdict, Verdict::Handled(0));
    assert_eq!(
        f.shell.take(),
        vec![
            Call::SetBounds(Rect::new(0, 0, 2560, 1439)),
            Call::Background(Some(Surface::Solid(BackgroundSettings::default().color))),
        ]
    );
    assert_eq!(f.renders.load(Ordering::SeqCst), 2);
}

#[test]
fn wallpaper_setting_change_invalidates_the_cache() {
    let mut f = fixture();
    created(&mut f);
    assert_eq!(f.renders.load(Ordering::SeqCst), 1);

    // Repeated focus churn does not re-render.
    f.desktop.window_message(WindowMessage::FocusGained);
    f.desktop.window_message(WindowMessage::FocusGained);
    assert_eq!(f.renders.load(Ordering::SeqCst), 1);

    f.desktop.window_message(WindowMessage::WallpaperChanged);
    assert_eq!(f.renders.load(Ordering::SeqCst), 2);
}

#[test]
fn activation_takes_shell_status_back() {
    let mut f = fixture();
    created(&mut f);

    f.desktop.handle_event(DesktopEvent::Activated);
    assert_eq!(f.shell.take(), vec![Call::SetShellWindow, Call::BottomMost]);

    // While the overlay has the window topmost, activation is expected.
    f.desktop.set_overlay(true);
    f.shell.take();
    f.desktop.handle_event(DesktopEvent::Activated);
    assert_eq!(f.shell.take(), vec![]);
}

#[test]
fn config_update_repaints_when_background_changes() {
    let mut f = fixture();
    created(&mut f);
    assert_eq!(f.renders.load(Ordering::SeqCst), 1);

    let mut config = Config::default();
    config.desktop.background.color = Color::rgb(0x10, 0x20, 0x30);
    f.desktop.handle_event(DesktopEvent::ConfigUpdated(Box::new(config.clone())));
    assert_eq!(f.renders.load(Ordering::SeqCst), 2);
    assert_eq!(
        f.shell.take(),
        vec![Call::Background(Some(Surface::Solid(Color::rgb(0x10, 0x20, 0x30))))]
    );

    // Same config again: nothing changed, nothing repainted.
    f.desktop.handle_event(DesktopEvent::ConfigUpdated(Box::new(config)));
    assert_eq!(f.renders.load(Ordering::SeqCst), 2);
}

#[test]
fn hotkey_toggle_round_trips_through_events() {
    let mut f = fixture();
    created(&mut f);

    f.desktop.handle_event(DesktopEvent::HotkeyPressed);
    assert!(f.desktop.overlay_open());
    f.desktop.handle_event(DesktopEvent::HotkeyPressed);
    assert!(!f.desktop.overlay_open());
    assert_eq!(overlay_events(&mut f.broadcast_rx), vec![true, false]);
}

#[test]
fn hotkey_registration_follows_settings() {
    let mut settings = DesktopSettings::default();
    settings.overlay_hotkey_enabled = true;
    let mut f = fixture_with(settings);
    f.desktop.handle_event(DesktopEvent::WindowCreated {
        handle: WindowHandle::new(0x10).unwrap(),
        display: Size::new(1920, 1080),
    });
    assert!(f.shell.take().contains(&Call::RegisterHotkey));

    let mut config = Config::default();
    config.desktop.overlay_hotkey_enabled = false;
    f.desktop.handle_event(DesktopEvent::ConfigUpdated(Box::new(config)));
    assert_eq!(f.shell.take(), vec![Call::UnregisterHotkey]);
}

#[test]
fn messages_before_window_creation_are_harmless() {
    let mut f = fixture();
    let reply = f.desktop.window_message(WindowMessage::FocusGained);
    assert_eq!(reply, MessageReply::default());
    f.desktop.set_overlay(true);
    assert!(!f.desktop.overlay_open());
    assert_eq!(f.shell.take(), vec![]);
}
