#![forbid(unsafe_code)]

//! Undo/redo command history for hotspot documents.
//!
//! Every mutation of a [`hotspot_core::Document`] goes through a command
//! that knows how to apply and exactly revert itself. The
//! [`HistoryManager`] runs commands and moves them between two stacks:
//!
//! ```text
//!   run(cmd)   ──► apply ──► undo stack  (redo stack cleared)
//!   undo()     ◄── revert ◄─ undo stack ──► redo stack
//!   redo()     ──► apply ──► redo stack ──► undo stack
//! ```
//!
//! # Module Structure
//!
//! - [`command`]: the [`UndoableCmd`] trait, metadata, and errors
//! - [`keyframe`]: add/remove/retime/move keyframe and toggle end flag
//! - [`hotspot`]: add/remove hotspots and edit their metadata
//! - [`history`]: the undo/redo engine
//!
//! # Design Notes
//!
//! Commands hold an explicit undo payload captured on first apply instead
//! of closures over shared state, and address hotspots by
//! [`hotspot_core::HotspotId`] so a command survives the hotspot being
//! removed and re-inserted by other history entries.

macro_rules! impl_any {
    () => {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

pub mod command;
pub mod history;
pub mod hotspot;
pub mod keyframe;

pub use command::{
    CommandError, CommandKind, CommandMetadata, CommandResult, CommandSource, UndoableCmd,
};
pub use history::{HistoryConfig, HistoryManager};
pub use hotspot::{AddHotspot, HotspotInfo, RemoveHotspot, SetHotspotInfo};
pub use keyframe::{
    AddKeyframe, MoveKeyframe, MoveKeyframeCta, MoveKeyframePosition, RemoveKeyframe,
    ToggleDirection, ToggleKeyframeEnd,
};
