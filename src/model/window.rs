//! Tracked application windows and their change feed.
//!
//! `TaskWindow` objects are owned by the window-tracking service; the
//! aggregation side only reads their properties and subscribes to typed
//! change notifications. The per-group member list (`WindowSeq`) is shared
//! the same way: the tracking boundary mutates it, observers snapshot it.

use std::fmt;
use std::num::NonZeroIsize;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use static_assertions::const_assert;

use crate::sys::app::Icon;

slotmap::new_key_type! {
    /// Identifies one property-change subscription on a window.
    pub struct SubscriptionKey;
}

/// Native handle of a tracked application window. Zero is never valid.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WindowId(NonZeroIsize);

impl WindowId {
    pub fn new(raw: isize) -> Option<WindowId> {
        NonZeroIsize::new(raw).map(WindowId)
    }

    pub fn as_raw(self) -> isize {
        self.0.get()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

#[derive(
    Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    #[default]
    Inactive,
    Active,
    Flashing,
}

#[derive(
    Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    #[default]
    NoProgress,
    Normal,
    Indeterminate,
}

// Merge priority rides on declaration order.
const_assert!((WindowState::Flashing as u8) > (WindowState::Active as u8));
const_assert!((WindowState::Active as u8) > (WindowState::Inactive as u8));
const_assert!((ProgressState::Indeterminate as u8) > (ProgressState::Normal as u8));
const_assert!((ProgressState::Normal as u8) > (ProgressState::NoProgress as u8));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayBadge {
    pub icon: Icon,
    pub description: String,
}

/// How the owning application is identified, decided once at the tracking
/// boundary so everything downstream can match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppKind {
    Packaged { aumid: String },
    Classic { exe: PathBuf },
}

#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub title: String,
    pub kind: AppKind,
}

/// Key a window's taskbar group is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn of(kind: &AppKind) -> GroupKey {
        match kind {
            AppKind::Packaged { aumid } => GroupKey(aumid.clone()),
            AppKind::Classic { exe } => GroupKey(exe.display().to_string()),
        }
    }

    /// Per-window key for hosts that disable application grouping.
    pub fn solo(kind: &AppKind, id: WindowId) -> GroupKey {
        GroupKey(format!("{}#{id}", GroupKey::of(kind).0))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed payload of a member change notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WindowProperty {
    State,
    OverlayBadge,
    ProgressState,
    ProgressValue,
}

type Subscriber = Box<dyn Fn(WindowId, WindowProperty) + Send>;

#[derive(Default)]
struct Observed {
    state: WindowState,
    progress_state: ProgressState,
    progress_value: u8,
    overlay_badge: Option<OverlayBadge>,
}

pub struct TaskWindow {
    id: WindowId,
    info: WindowInfo,
    observed: Mutex<Observed>,
    subscribers: Mutex<SlotMap<SubscriptionKey, Subscriber>>,
}

impl TaskWindow {
    pub fn new(id: WindowId, info: WindowInfo) -> Arc<TaskWindow> {
        Arc::new(TaskWindow {
            id,
            info,
            observed: Mutex::new(Observed::default()),
            subscribers: Mutex::new(SlotMap::with_key()),
        })
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn info(&self) -> &WindowInfo {
        &self.info
    }

    pub fn state(&self) -> WindowState {
        self.observed.lock().state
    }

    pub fn progress_state(&self) -> ProgressState {
        self.observed.lock().progress_state
    }

    pub fn progress_value(&self) -> u8 {
        self.observed.lock().progress_value
    }

    pub fn overlay_badge(&self) -> Option<OverlayBadge> {
        self.observed.lock().overlay_badge.clone()
    }

    pub fn set_state(&self, state: WindowState) {
        let changed = {
            let mut observed = self.observed.lock();
            let changed = observed.state != state;
            observed.state = state;
            changed
        };
        if changed {
            self.notify(WindowProperty::State);
        }
    }

    /// Progress value is clamped to 0..=100.
    pub fn set_progress(&self, state: ProgressState, value: u8) {
        let value = value.min(100);
        let (state_changed, value_changed) = {
            let mut observed = self.observed.lock();
            let state_changed = observed.progress_state != state;
            let value_changed = observed.progress_value != value;
            observed.progress_state = state;
            observed.progress_value = value;
            (state_changed, value_changed)
        };
        if state_changed {
            self.notify(WindowProperty::ProgressState);
        }
        if value_changed {
            self.notify(WindowProperty::ProgressValue);
        }
    }

    pub fn set_overlay_badge(&self, badge: Option<OverlayBadge>) {
        let changed = {
            let mut observed = self.observed.lock();
            let changed = observed.overlay_badge != badge;
            observed.overlay_badge = badge;
            changed
        };
        if changed {
            self.notify(WindowProperty::OverlayBadge);
        }
    }

    /// Register for change notifications. Subscribers are invoked on the
    /// thread that mutates the window and must not call back into
    /// subscribe/unsubscribe.
    pub fn subscribe(
        &self,
        subscriber: impl Fn(WindowId, WindowProperty) + Send + 'static,
    ) -> SubscriptionKey {
        self.subscribers.lock().insert(Box::new(subscriber))
    }

    pub fn unsubscribe(&self, key: SubscriptionKey) -> bool {
        self.subscribers.lock().remove(key).is_some()
    }

    fn notify(&self, property: WindowProperty) {
        let subscribers = self.subscribers.lock();
        for (_key, subscriber) in subscribers.iter() {
            subscriber(self.id, property);
        }
    }
}

impl fmt::Debug for TaskWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskWindow")
            .field("id", &self.id)
            .field("title", &self.info.title)
            .finish_non_exhaustive()
    }
}

/// Ordered, shared member list for one task group. Owned and mutated by
/// the window-tracking boundary; observers only snapshot it.
#[derive(Clone, Debug, Default)]
pub struct WindowSeq(Arc<RwLock<Vec<Arc<TaskWindow>>>>);

impl WindowSeq {
    pub fn new() -> WindowSeq {
        WindowSeq::default()
    }

    /// Consistent view for one computation pass.
    pub fn snapshot(&self) -> Vec<Arc<TaskWindow>> {
        self.0.read().clone()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn first(&self) -> Option<Arc<TaskWindow>> {
        self.0.read().first().cloned()
    }

    pub(crate) fn push(&self, window: Arc<TaskWindow>) {
        self.0.write().push(window);
    }

    pub(crate) fn remove(&self, id: WindowId) -> Option<Arc<TaskWindow>> {
        let mut windows = self.0.write();
        let index = windows.iter().position(|w| w.id() == id)?;
        Some(windows.remove(index))
    }
}
