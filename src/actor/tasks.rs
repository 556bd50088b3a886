//! Aggregates tracked application windows into taskbar groups.
//!
//! The window-tracking service feeds structural events through this actor's
//! channel; member property changes flow directly from window subscriptions
//! held by each group. Everything is handled on the interactive thread, so
//! structural work (subscribe/unsubscribe) always completes before the
//! notifications it triggers are observed.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::actor;
use crate::actor::broadcast::{BroadcastSender, ShellEvent};
use crate::actor::icons::IconLoader;
use crate::common::collections::HashMap;
use crate::model::task_group::{GroupNotifier, TaskGroup};
use crate::model::window::{AppKind, GroupKey, TaskWindow, WindowId, WindowSeq};
use crate::sys::app::{AppCatalog, Icon, IconSize};

pub type Sender = actor::Sender<TaskEvent>;
pub type Receiver = actor::Receiver<TaskEvent>;

#[derive(Debug)]
pub enum TaskEvent {
    /// The tracking service noticed a new top-level application window.
    WindowAdded(Arc<TaskWindow>),
    WindowRemoved(WindowId),
    /// Extraction result marshaled back from the icon work queue.
    IconResolved { key: GroupKey, icon: Icon },
}

struct GroupEntry {
    seq: WindowSeq,
    group: Arc<TaskGroup>,
}

pub struct Tasks {
    receiver: Receiver,
    sender: Sender,
    groups: HashMap<GroupKey, GroupEntry>,
    index: HashMap<WindowId, GroupKey>,
    catalog: Arc<dyn AppCatalog>,
    icons: IconLoader,
    broadcast_tx: BroadcastSender,
    icon_size: IconSize,
    group_by_application: bool,
}

impl Tasks {
    pub fn new(
        catalog: Arc<dyn AppCatalog>,
        icons: IconLoader,
        broadcast_tx: BroadcastSender,
        icon_size: IconSize,
        group_by_application: bool,
    ) -> (Self, Sender) {
        let (sender, receiver) = actor::channel();
        let this = Self {
            receiver,
            sender: sender.clone(),
            groups: HashMap::default(),
            index: HashMap::default(),
            catalog,
            icons,
            broadcast_tx,
            icon_size,
            group_by_application,
        };
        (this, sender)
    }

    pub async fn run(mut self) {
        while let Some((span, event)) = self.receiver.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
        }
    }

    #[instrument(name = "tasks::handle_event", skip(self))]
    pub fn handle_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::WindowAdded(window) => self.window_added(window),
            TaskEvent::WindowRemoved(id) => self.window_removed(id),
            TaskEvent::IconResolved { key, icon } => {
                if let Some(entry) = self.groups.get(&key) {
                    entry.group.set_icon(icon);
                } else {
                    debug!(%key, "icon resolved for a group that is gone");
                }
            }
        }
    }

    pub fn group(&self, key: &GroupKey) -> Option<&Arc<TaskGroup>> {
        self.groups.get(key).map(|entry| &entry.group)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn group_key(&self, window: &TaskWindow) -> GroupKey {
        if self.group_by_application {
            GroupKey::of(&window.info().kind)
        } else {
            GroupKey::solo(&window.info().kind, window.id())
        }
    }

    fn window_added(&mut self, window: Arc<TaskWindow>) {
        if self.index.contains_key(&window.id()) {
            warn!(id = %window.id(), "window already tracked; ignoring");
            return;
        }
        let key = self.group_key(&window);
        self.index.insert(window.id(), key.clone());

        if let Some(entry) = self.groups.get(&key) {
            entry.seq.push(window.clone());
            entry.group.member_added(&window);
            return;
        }

        // First window of this application; the group resolves its title
        // and icon from it.
        let seq = WindowSeq::new();
        seq.push(window.clone());
        let group = TaskGroup::new(
            key.clone(),
            seq.clone(),
            &*self.catalog,
            self.icon_size,
            self.group_notifier(key.clone()),
        );
        if let AppKind::Classic { exe } = &window.info().kind {
            let tx = self.sender.clone();
            let group_key = key.clone();
            self.icons.request(exe.clone(), self.icon_size, move |icon| {
                tx.send(TaskEvent::IconResolved { key: group_key, icon });
            });
        }
        self.groups.insert(key.clone(), GroupEntry { seq, group });
        self.broadcast_tx.send(ShellEvent::TaskGroupAdded { key });
    }

    fn group_notifier(&self, key: GroupKey) -> GroupNotifier {
        let tx = self.broadcast_tx.clone();
        Box::new(move |property| {
            tx.send(ShellEvent::TaskGroupChanged { key: key.clone(), property });
        })
    }

    fn window_removed(&mut self, id: WindowId) {
        let Some(key) = self.index.remove(&id) else {
            debug!(%id, "remove for untracked window");
            return;
        };
        let Some(entry) = self.groups.get(&key) else {
            return;
        };
        let Some(window) = entry.seq.remove(id) else {
            warn!(%id, %key, "window missing from its group's collection");
            return;
        };
        if entry.group.member_removed(&window) {
            // The group already published its final notification and
            // disposed itself.
            self.groups.remove(&key);
            self.broadcast_tx.send(ShellEvent::TaskGroupRemoved { key });
        }
    }
}
