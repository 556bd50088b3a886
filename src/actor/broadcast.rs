//! Change feed consumed by the taskbar and desktop presentation layers.

use serde::Serialize;

use crate::model::task_group::GroupProperty;
use crate::model::window::GroupKey;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum ShellEvent {
    TaskGroupAdded {
        key: GroupKey,
    },
    /// A derived property of the group changed; consumers re-read it from
    /// the group.
    TaskGroupChanged {
        key: GroupKey,
        property: GroupProperty,
    },
    TaskGroupRemoved {
        key: GroupKey,
    },
    OverlayChanged {
        open: bool,
    },
}

pub type BroadcastSender = crate::actor::Sender<ShellEvent>;
pub type BroadcastReceiver = crate::actor::Receiver<ShellEvent>;
