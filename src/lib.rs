//! Engine for a desktop-shell replacement: desktop window identity and
//! message interception, overlay ("peek") mode, and aggregation of
//! application windows into taskbar groups.
//!
//! The platform host owns the actual OS surface; it forwards raw window
//! messages into [`actor::desktop::Desktop`] and executes the shell
//! operations the engine requests through [`sys::shell::ShellOps`].

pub mod actor;
pub mod common;
pub mod model;
pub mod sys;
