#![forbid(unsafe_code)]

//! Reversible command infrastructure.
//!
//! Every edit to a [`Document`] is an [`UndoableCmd`]. A command is created
//! per user gesture, applied once by the history engine, and then owned by
//! the undo or redo stack for the rest of its life.
//!
//! # Invariants
//!
//! - `apply()` followed by `revert()` restores the document exactly,
//!   including side effects on neighbouring keyframes (end-flag propagation,
//!   CTA inheritance).
//! - `revert()` followed by `apply()` restores the applied state exactly.
//! - Commands validate before they mutate: an `Err` return means the
//!   document was not touched.
//!
//! # Failure Modes
//!
//! - **Stale reference**: the hotspot was removed or the keyframe index no
//!   longer exists because the document was changed outside history.
//!   Reported as [`CommandError::HotspotNotFound`] or
//!   [`CommandError::KeyframeOutOfBounds`].
//! - **Out-of-order use**: reverting a command that was never applied.
//!   Reported as [`CommandError::InvalidState`].

use std::any::Any;
use std::fmt;

use hotspot_core::{Document, Hotspot, HotspotId, Timeline};
use web_time::Instant;

/// Source of a command: who or what triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandSource {
    /// Direct user action (pointer, keyboard, dialog).
    #[default]
    User,
    /// Triggered programmatically by the host application.
    Programmatic,
}

/// Discriminant of the built-in command types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    AddHotspot,
    RemoveHotspot,
    SetHotspotInfo,
    AddKeyframe,
    RemoveKeyframe,
    MoveKeyframe,
    MoveKeyframePosition,
    MoveKeyframeCta,
    ToggleKeyframeEnd,
}

impl CommandKind {
    /// Stable name used in logs and notifications.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddHotspot => "add_hotspot",
            Self::RemoveHotspot => "remove_hotspot",
            Self::SetHotspotInfo => "set_hotspot_info",
            Self::AddKeyframe => "add_keyframe",
            Self::RemoveKeyframe => "remove_keyframe",
            Self::MoveKeyframe => "move_keyframe",
            Self::MoveKeyframePosition => "move_keyframe_position",
            Self::MoveKeyframeCta => "move_keyframe_cta",
            Self::ToggleKeyframeEnd => "toggle_keyframe_end",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to every command for tracing and UI display.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// Human-readable description for UI (e.g., "Add keyframe").
    pub description: String,
    /// When the command was created.
    pub timestamp: Instant,
    /// Who/what triggered the command.
    pub source: CommandSource,
}

impl CommandMetadata {
    /// Create new metadata with the given description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            timestamp: Instant::now(),
            source: CommandSource::User,
        }
    }

    /// Set the command source.
    #[must_use]
    pub fn with_source(mut self, source: CommandSource) -> Self {
        self.source = source;
        self
    }
}

/// Result of applying or reverting a command.
///
/// The `bool` reports whether the document should be treated as changed
/// (drives persistence notifications).
pub type CommandResult<T = bool> = Result<T, CommandError>;

/// Errors that can occur while applying or reverting a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Hotspot is not in the document.
    HotspotNotFound(HotspotId),
    /// Keyframe index does not exist.
    KeyframeOutOfBounds {
        hotspot: HotspotId,
        index: usize,
        len: usize,
    },
    /// Insert position is past the end of the list.
    InsertOutOfBounds {
        hotspot: HotspotId,
        index: usize,
        len: usize,
    },
    /// The keyframe time would break ascending order.
    OrderViolation {
        hotspot: HotspotId,
        index: usize,
        time: f64,
    },
    /// Command cannot run in the current state.
    InvalidState(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HotspotNotFound(id) => write!(f, "{id} not found"),
            Self::KeyframeOutOfBounds {
                hotspot,
                index,
                len,
            } => write!(f, "{hotspot}: keyframe {index} out of bounds (length {len})"),
            Self::InsertOutOfBounds {
                hotspot,
                index,
                len,
            } => write!(f, "{hotspot}: insert position {index} out of bounds (length {len})"),
            Self::OrderViolation {
                hotspot,
                index,
                time,
            } => write!(f, "{hotspot}: time {time} for keyframe {index} breaks ordering"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// A reversible edit of a [`Document`].
///
/// Commands own the payload needed to revert themselves; nothing is kept in
/// closures or shared state.
pub trait UndoableCmd: Send + Sync {
    /// Apply the command.
    fn apply(&mut self, document: &mut Document) -> CommandResult;

    /// Revert a previous `apply`.
    fn revert(&mut self, document: &mut Document) -> CommandResult;

    /// Re-apply after `revert`.
    fn redo(&mut self, document: &mut Document) -> CommandResult {
        self.apply(document)
    }

    /// Which built-in command this is.
    fn kind(&self) -> CommandKind;

    /// Get the command metadata.
    fn metadata(&self) -> &CommandMetadata;

    /// Human-readable description for UI display.
    fn description(&self) -> &str {
        &self.metadata().description
    }

    /// Hotspot the command edits.
    fn target(&self) -> Option<HotspotId> {
        None
    }

    /// Downcast to concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to mutable concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Debug description of the command.
    fn debug_name(&self) -> &'static str {
        "UndoableCmd"
    }
}

impl fmt::Debug for dyn UndoableCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.debug_name())
            .field("kind", &self.kind())
            .field("description", &self.description())
            .field("target", &self.target())
            .finish()
    }
}

// ============================================================================
// Lookup helpers
// ============================================================================

pub(crate) fn hotspot_mut(document: &mut Document, id: HotspotId) -> CommandResult<&mut Hotspot> {
    document.get_mut(id).ok_or(CommandError::HotspotNotFound(id))
}

pub(crate) fn timeline_mut(document: &mut Document, id: HotspotId) -> CommandResult<&mut Timeline> {
    Ok(&mut hotspot_mut(document, id)?.timeline)
}

/// Fail unless `index` names an existing keyframe.
pub(crate) fn check_keyframe(timeline: &Timeline, hotspot: HotspotId, index: usize) -> CommandResult<()> {
    if index < timeline.len() {
        Ok(())
    } else {
        Err(CommandError::KeyframeOutOfBounds {
            hotspot,
            index,
            len: timeline.len(),
        })
    }
}

/// Fail unless `time` fits strictly between the neighbours of slot `index`.
///
/// `has_self` is true when `index` is occupied by the keyframe being
/// retimed (its right neighbour is then `index + 1`).
pub(crate) fn check_order(
    timeline: &Timeline,
    hotspot: HotspotId,
    index: usize,
    time: f64,
    has_self: bool,
) -> CommandResult<()> {
    let next_index = if has_self { index + 1 } else { index };
    let after_prev = index
        .checked_sub(1)
        .and_then(|prev| timeline.get(prev))
        .is_none_or(|prev| prev.t < time);
    let before_next = timeline.get(next_index).is_none_or(|next| time < next.t);

    if time.is_finite() && time >= 0.0 && after_prev && before_next {
        Ok(())
    } else {
        Err(CommandError::OrderViolation {
            hotspot,
            index,
            time,
        })
    }
}
