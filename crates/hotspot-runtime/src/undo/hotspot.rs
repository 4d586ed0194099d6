#![forbid(unsafe_code)]

//! Hotspot-level commands: add, remove, and edit metadata.
//!
//! Removed hotspots keep their [`HotspotId`] while they sit in a command's
//! payload, so keyframe commands further down the undo stack still find
//! them after the removal is reverted.

use std::any::Any;

use hotspot_core::{CallToAction, Document, Hotspot, HotspotId};

use super::command::{
    CommandError, CommandKind, CommandMetadata, CommandResult, UndoableCmd, hotspot_mut,
};

/// Check that `hotspot` can go back into `document` at `index`.
fn check_insert(document: &Document, hotspot: &Hotspot, index: usize) -> CommandResult<()> {
    let id = hotspot.id();
    if index > document.len() {
        return Err(CommandError::InsertOutOfBounds {
            hotspot: id,
            index,
            len: document.len(),
        });
    }
    if id.is_assigned() && document.contains(id) {
        return Err(CommandError::InvalidState(format!("{id} is already in the document")));
    }
    Ok(())
}

fn insert(document: &mut Document, index: usize, hotspot: Hotspot) -> CommandResult<HotspotId> {
    document
        .insert_at(index, hotspot)
        .map_err(|err| CommandError::InvalidState(err.to_string()))
}

// ============================================================================
// AddHotspot
// ============================================================================

/// Append a new hotspot.
#[derive(Debug, Clone)]
pub struct AddHotspot {
    /// Hotspot waiting to be (re)inserted.
    staged: Option<Hotspot>,
    /// Position the hotspot was removed from by the last `revert`.
    position: Option<usize>,
    id: Option<HotspotId>,
    metadata: CommandMetadata,
}

impl AddHotspot {
    /// Create the command for a hotspot that is not in any document yet.
    #[must_use]
    pub fn new(hotspot: Hotspot) -> Self {
        Self {
            staged: Some(hotspot),
            position: None,
            id: None,
            metadata: CommandMetadata::new("Add hotspot"),
        }
    }

    /// Id assigned by the first `apply`.
    #[must_use]
    pub fn hotspot_id(&self) -> Option<HotspotId> {
        self.id
    }
}

impl UndoableCmd for AddHotspot {
    fn apply(&mut self, document: &mut Document) -> CommandResult {
        let hotspot = self
            .staged
            .take()
            .ok_or_else(|| CommandError::InvalidState("AddHotspot is already applied".to_string()))?;
        let index = self.position.unwrap_or(document.len());
        if let Err(err) = check_insert(document, &hotspot, index) {
            self.staged = Some(hotspot);
            return Err(err);
        }

        self.id = Some(insert(document, index, hotspot)?);
        Ok(true)
    }

    fn revert(&mut self, document: &mut Document) -> CommandResult {
        let id = match (self.id, &self.staged) {
            (Some(id), None) => id,
            _ => {
                return Err(CommandError::InvalidState(
                    "AddHotspot was not applied".to_string(),
                ));
            }
        };
        let (index, hotspot) = document.remove(id).ok_or(CommandError::HotspotNotFound(id))?;
        self.position = Some(index);
        self.staged = Some(hotspot);
        Ok(true)
    }

    fn kind(&self) -> CommandKind {
        CommandKind::AddHotspot
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn target(&self) -> Option<HotspotId> {
        self.id
    }

    impl_any!();

    fn debug_name(&self) -> &'static str {
        "AddHotspot"
    }
}

// ============================================================================
// RemoveHotspot
// ============================================================================

/// Delete a hotspot; `revert` puts it back at the same list position.
#[derive(Debug, Clone)]
pub struct RemoveHotspot {
    hotspot: HotspotId,
    removed: Option<(usize, Hotspot)>,
    metadata: CommandMetadata,
}

impl RemoveHotspot {
    /// Create the command.
    #[must_use]
    pub fn new(hotspot: HotspotId) -> Self {
        Self {
            hotspot,
            removed: None,
            metadata: CommandMetadata::new("Remove hotspot"),
        }
    }
}

impl UndoableCmd for RemoveHotspot {
    fn apply(&mut self, document: &mut Document) -> CommandResult {
        if self.removed.is_some() {
            return Err(CommandError::InvalidState(
                "RemoveHotspot is already applied".to_string(),
            ));
        }
        let removed = document
            .remove(self.hotspot)
            .ok_or(CommandError::HotspotNotFound(self.hotspot))?;
        self.removed = Some(removed);
        Ok(true)
    }

    fn revert(&mut self, document: &mut Document) -> CommandResult {
        let Some((index, hotspot)) = self.removed.as_ref() else {
            return Err(CommandError::InvalidState(
                "RemoveHotspot was not applied".to_string(),
            ));
        };
        check_insert(document, hotspot, *index)?;

        if let Some((index, hotspot)) = self.removed.take() {
            insert(document, index, hotspot)?;
        }
        Ok(true)
    }

    fn kind(&self) -> CommandKind {
        CommandKind::RemoveHotspot
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn target(&self) -> Option<HotspotId> {
        Some(self.hotspot)
    }

    impl_any!();

    fn debug_name(&self) -> &'static str {
        "RemoveHotspot"
    }
}

// ============================================================================
// SetHotspotInfo
// ============================================================================

/// The user-editable metadata of a hotspot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HotspotInfo {
    pub target: String,
    pub selector: String,
    pub cta: Option<CallToAction>,
}

impl HotspotInfo {
    /// Snapshot the metadata of `hotspot`.
    #[must_use]
    pub fn of(hotspot: &Hotspot) -> Self {
        Self {
            target: hotspot.target.clone(),
            selector: hotspot.selector.clone(),
            cta: hotspot.cta.clone(),
        }
    }

    fn swap_into(&mut self, hotspot: &mut Hotspot) {
        std::mem::swap(&mut self.target, &mut hotspot.target);
        std::mem::swap(&mut self.selector, &mut hotspot.selector);
        std::mem::swap(&mut self.cta, &mut hotspot.cta);
    }
}

/// Replace a hotspot's target, selector, and CTA metadata.
///
/// The lifecycle flags belong to the metadata dialog: the engine ignores
/// them, and [`crate::EditingContext::close_hotspot_dialog`] reads them to
/// decide whether to run this command and whether to follow it with a
/// [`RemoveHotspot`].
#[derive(Debug, Clone)]
pub struct SetHotspotInfo {
    hotspot: HotspotId,
    /// New metadata.
    pub info: HotspotInfo,
    /// The dialog was dismissed without saving.
    pub cancelled: bool,
    /// The user asked to delete the hotspot.
    pub deleted: bool,
    /// The dialog was opened for a freshly created hotspot.
    pub is_new: bool,
    previous: Option<HotspotInfo>,
    metadata: CommandMetadata,
}

impl SetHotspotInfo {
    /// Create the command.
    #[must_use]
    pub fn new(hotspot: HotspotId, info: HotspotInfo) -> Self {
        Self {
            hotspot,
            info,
            cancelled: false,
            deleted: false,
            is_new: false,
            previous: None,
            metadata: CommandMetadata::new("Edit hotspot"),
        }
    }

    /// Hotspot being edited.
    #[must_use]
    pub fn hotspot(&self) -> HotspotId {
        self.hotspot
    }
}

impl UndoableCmd for SetHotspotInfo {
    fn apply(&mut self, document: &mut Document) -> CommandResult {
        if self.previous.is_some() {
            return Err(CommandError::InvalidState(
                "SetHotspotInfo is already applied".to_string(),
            ));
        }
        let hotspot = hotspot_mut(document, self.hotspot)?;
        let mut previous = self.info.clone();
        previous.swap_into(hotspot);
        self.previous = Some(previous);
        Ok(true)
    }

    fn revert(&mut self, document: &mut Document) -> CommandResult {
        if self.previous.is_none() {
            return Err(CommandError::InvalidState(
                "SetHotspotInfo was not applied".to_string(),
            ));
        }
        let hotspot = hotspot_mut(document, self.hotspot)?;
        if let Some(mut previous) = self.previous.take() {
            previous.swap_into(hotspot);
        }
        Ok(true)
    }

    fn kind(&self) -> CommandKind {
        CommandKind::SetHotspotInfo
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn target(&self) -> Option<HotspotId> {
        Some(self.hotspot)
    }

    impl_any!();

    fn debug_name(&self) -> &'static str {
        "SetHotspotInfo"
    }
}
