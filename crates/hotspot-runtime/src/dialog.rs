#![forbid(unsafe_code)]

//! Hotspot metadata dialog flow.
//!
//! The dialog itself is drawn by the host. This module prepares the
//! [`SetHotspotInfo`] command the dialog edits and interprets its lifecycle
//! flags when the dialog closes:
//!
//! ```text
//! open ──► user edits info ──► close
//!                               ├─ cancelled      → nothing recorded
//!                               ├─ saved          → SetHotspotInfo
//!                               └─ deleted        → RemoveHotspot (after
//!                                                   any saved edits)
//! ```

use hotspot_core::{Hotspot, HotspotId};

use crate::context::EditingContext;
use crate::undo::{
    AddHotspot, CommandError, CommandResult, HotspotInfo, RemoveHotspot, SetHotspotInfo,
    UndoableCmd,
};

/// An open metadata dialog.
#[derive(Debug, Clone)]
pub struct HotspotDialog {
    /// Command pre-filled with the hotspot's current metadata; the host
    /// edits `info` and sets the lifecycle flags.
    pub command: SetHotspotInfo,
}

impl HotspotDialog {
    /// Open the dialog for `hotspot`.
    #[must_use]
    pub fn open(hotspot: &Hotspot) -> Self {
        Self {
            command: SetHotspotInfo::new(hotspot.id(), HotspotInfo::of(hotspot)),
        }
    }

    /// Hotspot being edited.
    #[must_use]
    pub fn hotspot(&self) -> HotspotId {
        self.command.hotspot()
    }

    /// Editable metadata.
    pub fn info_mut(&mut self) -> &mut HotspotInfo {
        &mut self.command.info
    }

    /// Whether the dialog was opened for a hotspot created just before.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.command.is_new
    }

    /// Dismiss without saving.
    pub fn cancel(&mut self) {
        self.command.cancelled = true;
    }

    /// Request deletion of the hotspot.
    pub fn delete(&mut self) {
        self.command.deleted = true;
    }
}

impl EditingContext {
    /// Add a hotspot from the configured template, select it, and open its
    /// dialog.
    pub fn create_hotspot(&mut self) -> CommandResult<HotspotDialog> {
        self.run(AddHotspot::new(self.config.new_hotspot.template()))?;
        let id = self
            .history
            .last_command()
            .and_then(|cmd| cmd.as_any().downcast_ref::<AddHotspot>())
            .and_then(AddHotspot::hotspot_id)
            .ok_or_else(|| CommandError::InvalidState("added hotspot has no id".to_string()))?;
        self.select(Some(id));

        let mut dialog = self.open_hotspot_dialog(id)?;
        dialog.command.is_new = true;
        Ok(dialog)
    }

    /// Open the metadata dialog for an existing hotspot.
    pub fn open_hotspot_dialog(&self, hotspot: HotspotId) -> CommandResult<HotspotDialog> {
        self.document
            .get(hotspot)
            .map(HotspotDialog::open)
            .ok_or(CommandError::HotspotNotFound(hotspot))
    }

    /// Apply the outcome of a closed dialog.
    ///
    /// Saves the edits unless the dialog was cancelled, then removes the
    /// hotspot if deletion was requested. Returns whether it was cancelled.
    pub fn close_hotspot_dialog(&mut self, dialog: HotspotDialog) -> CommandResult<bool> {
        let command = dialog.command;
        let (cancelled, deleted, id) = (command.cancelled, command.deleted, command.hotspot());
        tracing::debug!(target: "hotspot.selection", hotspot = %id, cancelled, deleted, "hotspot dialog closed");

        if !cancelled {
            self.run(command)?;
        }
        if deleted {
            self.run(RemoveHotspot::new(id))?;
        }
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_core::{CallToAction, Document};

    #[test]
    fn create_opens_new_dialog_with_template() {
        let mut ctx = EditingContext::new(Document::default());
        let dialog = ctx.create_hotspot().unwrap();
        assert!(dialog.is_new());
        assert_eq!(ctx.selection().hotspot(), Some(dialog.hotspot()));
        assert_eq!(dialog.command.info.target, "example");
        assert_eq!(dialog.command.info.cta, Some(CallToAction::default()));
    }

    #[test]
    fn create_selects_the_hotspot_the_command_added() {
        let mut doc = Document::default();
        let existing = doc.push(Hotspot::new("shoe", ".shoe"));
        let mut ctx = EditingContext::new(doc);

        let dialog = ctx.create_hotspot().unwrap();
        let added = ctx
            .history()
            .last_command()
            .and_then(|cmd| cmd.as_any().downcast_ref::<AddHotspot>())
            .and_then(AddHotspot::hotspot_id);
        assert_eq!(added, Some(dialog.hotspot()));
        assert_ne!(dialog.hotspot(), existing);
        assert_eq!(ctx.document().get(dialog.hotspot()).unwrap().target, "example");
    }

    #[test]
    fn saving_records_one_edit() {
        let mut ctx = EditingContext::new(Document::default());
        let mut dialog = ctx.create_hotspot().unwrap();
        dialog.info_mut().target = "shoe".to_string();
        let id = dialog.hotspot();

        assert!(!ctx.close_hotspot_dialog(dialog).unwrap());
        assert_eq!(ctx.document().get(id).unwrap().target, "shoe");
        assert_eq!(ctx.history().undo_depth(), 2);
    }

    #[test]
    fn cancel_records_nothing() {
        let mut ctx = EditingContext::new(Document::default());
        let mut dialog = ctx.create_hotspot().unwrap();
        dialog.info_mut().target = "ignored".to_string();
        dialog.cancel();
        assert!(ctx.close_hotspot_dialog(dialog).unwrap());
        assert_eq!(ctx.document().hotspots()[0].target, "example");
        assert_eq!(ctx.history().undo_depth(), 1);
    }

    #[test]
    fn delete_removes_and_undo_restores() {
        let mut ctx = EditingContext::new(Document::default());
        let dialog = ctx.create_hotspot().unwrap();
        let id = dialog.hotspot();
        ctx.close_hotspot_dialog(dialog).unwrap();

        let mut dialog = ctx.open_hotspot_dialog(id).unwrap();
        assert!(!dialog.is_new());
        dialog.delete();
        ctx.close_hotspot_dialog(dialog).unwrap();
        assert!(ctx.document().is_empty());
        assert!(ctx.selection().is_empty());

        ctx.undo().unwrap().unwrap();
        assert!(ctx.document().contains(id));
    }
}
