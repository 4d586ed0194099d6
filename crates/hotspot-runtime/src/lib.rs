#![forbid(unsafe_code)]

//! Hotspot Runtime
//!
//! Editing layer for video hotspot documents: every change to a
//! [`hotspot_core::Document`] goes through a reversible command recorded in
//! a bounded undo/redo history.
//!
//! # Key Components
//!
//! - [`EditingContext`] - The document under edit plus history, playhead,
//!   selection, and configuration
//! - [`UndoableCmd`] - Trait for reversible document edits
//! - [`HistoryManager`] - Bounded undo/redo stacks
//! - [`DragCoordinator`] - Pointer press/drag/release state machine
//! - [`HotspotDialog`] - Metadata dialog lifecycle
//! - [`EditorEvents`] - Change notifications for views
//! - [`EditorConfig`] - Tunables, loadable from TOML/JSON
//!
//! # Role in the editor
//! `hotspot-runtime` sits between the host UI and `hotspot-core`. The host
//! forwards pointer and keyboard input and the video clock; the runtime
//! turns them into commands and reports back what to draw and where to
//! seek.
//!
//! # Logging
//! All diagnostics go through `tracing`. Targets: `hotspot.history`,
//! `hotspot.selection`, `hotspot.interaction`, `hotspot.config`. Every
//! history operation runs inside an `editor.command` span.

pub mod config;
pub mod context;
pub mod dialog;
pub mod events;
pub mod interaction;
pub mod selection;
pub mod undo;

pub use config::{ConfigError, EditorConfig, NewHotspotConfig};
pub use context::EditingContext;
pub use dialog::HotspotDialog;
pub use events::{CommandDirection, EditorEvent, EditorEvents, Subscription};
pub use interaction::{DragCoordinator, DragOutcome, InteractionConfig, Viewport};
pub use selection::Selection;
pub use undo::{
    AddHotspot, AddKeyframe, CommandError, CommandKind, CommandMetadata, CommandResult,
    CommandSource, HistoryConfig, HistoryManager, HotspotInfo, MoveKeyframe, MoveKeyframeCta,
    MoveKeyframePosition, RemoveHotspot, RemoveKeyframe, SetHotspotInfo, ToggleDirection,
    ToggleKeyframeEnd, UndoableCmd,
};
