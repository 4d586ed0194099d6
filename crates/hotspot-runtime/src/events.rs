#![forbid(unsafe_code)]

//! Change notifications for renderers and persistence.
//!
//! The history engine emits an [`EditorEvent`] after every command that
//! changed the document. Listeners (the canvas renderer, the timeline strip,
//! the component that saves the document) subscribe with a callback and
//! keep the returned [`Subscription`] alive for as long as they want to hear
//! about changes.
//!
//! # Invariants
//!
//! 1. Subscribers are called in registration order.
//! 2. `DocumentChanged` is always emitted before the matching `CommandRun`.
//! 3. Dropped subscriptions are never called again; their slots are pruned
//!    lazily on the next emit.
//!
//! # Failure Modes
//!
//! - **Re-entrant subscribe**: subscribing from inside a callback is allowed;
//!   the new subscriber first hears the next event, not the current one.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::undo::CommandKind;

/// Which history operation produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandDirection {
    Run,
    Undo,
    Redo,
}

impl CommandDirection {
    /// Stable name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

impl fmt::Display for CommandDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// The document should be re-rendered and persisted.
    DocumentChanged,
    /// A command was run, undone, or redone.
    CommandRun {
        kind: CommandKind,
        direction: CommandDirection,
    },
}

type CallbackRc = Rc<dyn Fn(&EditorEvent)>;
type CallbackWeak = Weak<dyn Fn(&EditorEvent)>;

/// Broadcast channel for [`EditorEvent`]s.
///
/// Cloning creates another handle to the same subscriber list.
#[derive(Clone, Default)]
pub struct EditorEvents {
    subscribers: Rc<RefCell<Vec<CallbackWeak>>>,
}

impl fmt::Debug for EditorEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorEvents")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl EditorEvents {
    /// Create a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Dropping the returned guard unsubscribes it.
    pub fn subscribe(&self, callback: impl Fn(&EditorEvent) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription { _guard: strong }
    }

    /// Number of registered subscribers, including dropped ones not yet
    /// pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Deliver `event` to every live subscriber.
    pub fn emit(&self, event: EditorEvent) {
        let callbacks: Vec<CallbackRc> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in callbacks {
            callback(&event);
        }
    }

    /// Emit the pair of events for a command that changed the document.
    pub(crate) fn emit_command(&self, kind: CommandKind, direction: CommandDirection) {
        self.emit(EditorEvent::DocumentChanged);
        self.emit(EditorEvent::CommandRun { kind, direction });
    }
}

/// RAII guard for an [`EditorEvents`] subscription.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: CallbackRc,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
