//! Aggregation of application windows into a single taskbar unit.
//!
//! A group observes a shared member list it does not own, merges the
//! members' states under fixed tie-break rules, and republishes one
//! group-level notification for any relevant member change. Consumers treat
//! the group as the unit of observation, never individual windows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::common::collections::HashMap;
use crate::model::window::{
    AppKind, GroupKey, OverlayBadge, ProgressState, SubscriptionKey, TaskWindow, WindowId,
    WindowProperty, WindowSeq, WindowState,
};
use crate::sys::app::{AppCatalog, Icon, IconSize};

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupProperty {
    Title,
    Icon,
    State,
    OverlayBadge,
    ProgressState,
    ProgressValue,
}

/// Receives the group's republished change notifications.
pub type GroupNotifier = Box<dyn Fn(GroupProperty) + Send + Sync>;

pub struct TaskGroup {
    key: GroupKey,
    windows: WindowSeq,
    title: Mutex<String>,
    icon: Mutex<Option<Icon>>,
    subscriptions: Mutex<HashMap<WindowId, SubscriptionKey>>,
    disposed: AtomicBool,
    notify: GroupNotifier,
    // Handed to member subscriptions so they never keep the group alive.
    weak: Weak<TaskGroup>,
}

impl TaskGroup {
    /// Build a group over `windows`. An empty collection produces an inert
    /// group that observes nothing and never notifies.
    pub fn new(
        key: GroupKey,
        windows: WindowSeq,
        catalog: &dyn AppCatalog,
        icon_size: IconSize,
        notify: GroupNotifier,
    ) -> Arc<TaskGroup> {
        let group = Arc::new_cyclic(|weak| TaskGroup {
            key,
            windows,
            title: Mutex::new(String::new()),
            icon: Mutex::new(None),
            subscriptions: Mutex::new(HashMap::default()),
            disposed: AtomicBool::new(false),
            notify,
            weak: weak.clone(),
        });

        let members = group.windows.snapshot();
        let Some(first) = members.first() else {
            return group;
        };
        for window in &members {
            group.observe(window);
        }
        group.resolve_identity(first, catalog, icon_size);
        group
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn title(&self) -> String {
        self.title.lock().clone()
    }

    pub fn icon(&self) -> Option<Icon> {
        *self.icon.lock()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Title and icon come from the first member: packaged-app metadata is
    /// synchronous; a classic executable's icon arrives later from the
    /// extraction queue via [`TaskGroup::set_icon`].
    fn resolve_identity(&self, first: &Arc<TaskWindow>, catalog: &dyn AppCatalog, size: IconSize) {
        match &first.info().kind {
            AppKind::Packaged { aumid } => match catalog.packaged_app(aumid, size) {
                Some(app) => {
                    *self.title.lock() = app.display_name;
                    *self.icon.lock() = app.icon;
                }
                None => {
                    debug!(%aumid, "packaged app not in catalog; falling back to window title");
                    *self.title.lock() = first.info().title.clone();
                }
            },
            AppKind::Classic { exe } => {
                let title = catalog
                    .file_description(exe)
                    .unwrap_or_else(|| first.info().title.clone());
                *self.title.lock() = title;
            }
        }
    }

    /// Delivered from the icon-resolution queue on the interactive thread.
    pub fn set_icon(&self, icon: Icon) {
        if self.is_disposed() {
            return;
        }
        *self.icon.lock() = Some(icon);
        (self.notify)(GroupProperty::Icon);
    }

    /// Merged activation state: a single flashing member flashes the whole
    /// group, regardless of other members' activity.
    pub fn state(&self) -> WindowState {
        let members = self.windows.snapshot();
        if members.iter().any(|w| w.state() == WindowState::Flashing) {
            return WindowState::Flashing;
        }
        if members.iter().any(|w| w.state() == WindowState::Active) {
            return WindowState::Active;
        }
        WindowState::Inactive
    }

    /// First member with a badge wins, in collection order.
    pub fn overlay_badge(&self) -> Option<OverlayBadge> {
        self.windows.snapshot().iter().find_map(|w| w.overlay_badge())
    }

    pub fn overlay_description(&self) -> Option<String> {
        self.overlay_badge().map(|badge| badge.description)
    }

    pub fn progress_state(&self) -> ProgressState {
        let members = self.windows.snapshot();
        if members.iter().any(|w| w.progress_state() == ProgressState::Indeterminate) {
            return ProgressState::Indeterminate;
        }
        if members.iter().any(|w| w.progress_state() == ProgressState::Normal) {
            return ProgressState::Normal;
        }
        ProgressState::NoProgress
    }

    /// Mean of the positive member values, truncated; idle members do not
    /// drag the average down. 0 when nothing is in progress.
    pub fn progress_value(&self) -> u8 {
        let members = self.windows.snapshot();
        let count = members.iter().filter(|w| w.progress_value() > 0).count() as u32;
        if count == 0 {
            return 0;
        }
        let total: u32 = members.iter().map(|w| w.progress_value() as u32).sum();
        (total / count) as u8
    }

    /// Structural notification: a window joined the shared collection.
    pub fn member_added(&self, window: &Arc<TaskWindow>) {
        if self.is_disposed() {
            return;
        }
        self.observe(window);
        (self.notify)(GroupProperty::State);
    }

    /// Structural notification: a window left the shared collection. The
    /// member is unsubscribed before anything is published. Returns true
    /// when the removal emptied the group; the group has then published its
    /// final notification and disposed itself.
    pub fn member_removed(&self, window: &Arc<TaskWindow>) -> bool {
        if self.is_disposed() {
            return false;
        }
        if let Some(key) = self.subscriptions.lock().remove(&window.id()) {
            window.unsubscribe(key);
        }
        (self.notify)(GroupProperty::State);
        if self.windows.is_empty() {
            self.dispose_with(&self.windows.snapshot());
            return true;
        }
        false
    }

    /// Idempotent; safe to call on a group that never finished wiring up.
    pub fn dispose(&self) {
        self.dispose_with(&self.windows.snapshot());
    }

    fn dispose_with(&self, members: &[Arc<TaskWindow>]) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut subscriptions = self.subscriptions.lock();
        for (id, key) in subscriptions.drain() {
            // Members the collection already dropped can no longer be
            // detached here; their callbacks are dead weak references.
            if let Some(window) = members.iter().find(|w| w.id() == id) {
                window.unsubscribe(key);
            }
        }
    }

    fn observe(&self, window: &Arc<TaskWindow>) {
        let weak = self.weak.clone();
        let key = window.subscribe(move |_id, property| {
            if let Some(group) = weak.upgrade() {
                group.member_changed(property);
            }
        });
        self.subscriptions.lock().insert(window.id(), key);
    }

    fn member_changed(&self, property: WindowProperty) {
        if self.is_disposed() {
            return;
        }
        let mapped = match property {
            WindowProperty::State => GroupProperty::State,
            WindowProperty::OverlayBadge => GroupProperty::OverlayBadge,
            WindowProperty::ProgressState => GroupProperty::ProgressState,
            WindowProperty::ProgressValue => GroupProperty::ProgressValue,
        };
        (self.notify)(mapped);
    }
}

impl Drop for TaskGroup {
    fn drop(&mut self) {
        self.dispose();
    }
}
