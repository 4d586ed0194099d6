#![forbid(unsafe_code)]

//! Keyframe commands.
//!
//! Inserting or removing a keyframe has side effects on its neighbours so
//! that visibility gaps and CTA anchors keep their meaning:
//!
//! ```text
//! AddKeyframe at i:
//!   points[i-1].e          -> cleared (the new keyframe closes the gap)
//!   points[i+1].cta (donor) -> moved onto the new keyframe
//!
//! RemoveKeyframe at i (removed = X):
//!   X.e and !P.e           -> P.e = true (gap preserved)
//!   X.cta and !X.e         -> copied onto P (unless P.e) and onto the
//!                             keyframe that now occupies i
//! ```
//!
//! Each command records exactly what it touched so `revert` can restore the
//! neighbours field by field.
//!
//! # Invariants
//!
//! 1. Timelines stay strictly ascending after every `apply` and `revert`.
//! 2. A command's payload is captured on `apply` and consumed on `revert`;
//!    reverting twice is an [`CommandError::InvalidState`].

use std::any::Any;
use std::mem;

use hotspot_core::{Document, HotspotId, Point, TimePoint, Timeline};

use super::command::{
    CommandError, CommandKind, CommandMetadata, CommandResult, UndoableCmd, check_keyframe,
    check_order, timeline_mut,
};

fn not_applied(what: &str) -> CommandError {
    CommandError::InvalidState(format!("{what} was not applied"))
}

// ============================================================================
// AddKeyframe
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct AddUndo {
    /// The predecessor's end flag was cleared.
    cleared_end: bool,
    /// The following keyframe donated its CTA; holds the new keyframe's own
    /// CTA from before the transfer.
    inherited: Option<Option<Point>>,
}

/// Insert a keyframe at `index`.
#[derive(Debug, Clone)]
pub struct AddKeyframe {
    hotspot: HotspotId,
    index: usize,
    point: TimePoint,
    undo: Option<AddUndo>,
    metadata: CommandMetadata,
}

impl AddKeyframe {
    /// Create the command. `index` is usually [`hotspot_core::Nearest::insertion_index`].
    #[must_use]
    pub fn new(hotspot: HotspotId, point: TimePoint, index: usize) -> Self {
        Self {
            hotspot,
            index,
            point,
            undo: None,
            metadata: CommandMetadata::new("Add keyframe"),
        }
    }

    /// Insert position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The keyframe as it will be (re)inserted.
    ///
    /// After `revert` this reflects any edits made to the keyframe while it
    /// was in the document.
    #[must_use]
    pub fn point(&self) -> &TimePoint {
        &self.point
    }
}

impl UndoableCmd for AddKeyframe {
    fn apply(&mut self, document: &mut Document) -> CommandResult {
        let (hotspot, index) = (self.hotspot, self.index);
        let timeline = timeline_mut(document, hotspot)?;
        if index > timeline.len() {
            return Err(CommandError::InsertOutOfBounds {
                hotspot,
                index,
                len: timeline.len(),
            });
        }
        check_order(timeline, hotspot, index, self.point.t, false)?;

        let mut point = self.point.clone();

        let cleared_end = match index.checked_sub(1).and_then(|i| timeline.get_mut(i)) {
            Some(prev) if prev.e => {
                prev.e = false;
                true
            }
            _ => false,
        };

        let inherited = match timeline.get_mut(index) {
            Some(donor) if donor.cta.is_some() => {
                let own = mem::replace(&mut point.cta, donor.cta.take());
                Some(own)
            }
            _ => None,
        };

        timeline.insert(index, point);
        self.undo = Some(AddUndo {
            cleared_end,
            inherited,
        });
        Ok(true)
    }

    fn revert(&mut self, document: &mut Document) -> CommandResult {
        let (hotspot, index) = (self.hotspot, self.index);
        let undo = self.undo.ok_or_else(|| not_applied("AddKeyframe"))?;
        let timeline = timeline_mut(document, hotspot)?;
        check_keyframe(timeline, hotspot, index)?;
        if undo.inherited.is_some() {
            check_keyframe(timeline, hotspot, index + 1)?;
        }

        let mut removed = timeline.remove(index);

        if let Some(own) = undo.inherited
            && let Some(donor) = timeline.get_mut(index)
        {
            donor.cta = mem::replace(&mut removed.cta, own);
        }

        if undo.cleared_end
            && let Some(prev) = index.checked_sub(1).and_then(|i| timeline.get_mut(i))
        {
            prev.e = true;
        }

        self.point = removed;
        self.undo = None;
        Ok(true)
    }

    fn kind(&self) -> CommandKind {
        CommandKind::AddKeyframe
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn target(&self) -> Option<HotspotId> {
        Some(self.hotspot)
    }

    impl_any!();

    fn debug_name(&self) -> &'static str {
        "AddKeyframe"
    }
}

// ============================================================================
// RemoveKeyframe
// ============================================================================

#[derive(Debug, Clone)]
struct RemoveUndo {
    removed: TimePoint,
    /// The predecessor gained the end flag.
    propagated_end: bool,
    /// Predecessor CTA before it was overwritten.
    prev_cta: Option<Option<Point>>,
    /// CTA of the keyframe that moved into `index`, before it was overwritten.
    next_cta: Option<Option<Point>>,
}

/// Delete the keyframe at `index`.
#[derive(Debug, Clone)]
pub struct RemoveKeyframe {
    hotspot: HotspotId,
    index: usize,
    undo: Option<RemoveUndo>,
    metadata: CommandMetadata,
}

impl RemoveKeyframe {
    /// Create the command.
    #[must_use]
    pub fn new(hotspot: HotspotId, index: usize) -> Self {
        Self {
            hotspot,
            index,
            undo: None,
            metadata: CommandMetadata::new("Remove keyframe"),
        }
    }

    /// Removed position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl UndoableCmd for RemoveKeyframe {
    fn apply(&mut self, document: &mut Document) -> CommandResult {
        let (hotspot, index) = (self.hotspot, self.index);
        let timeline = timeline_mut(document, hotspot)?;
        check_keyframe(timeline, hotspot, index)?;

        let removed = timeline.remove(index);
        let mut propagated_end = false;
        let mut prev_cta = None;
        let mut next_cta = None;

        if let Some(prev) = index.checked_sub(1).and_then(|i| timeline.get_mut(i)) {
            if removed.e && !prev.e {
                prev.e = true;
                propagated_end = true;
            }
            if let Some(cta) = removed.cta
                && !removed.e
                && !prev.e
            {
                prev_cta = Some(mem::replace(&mut prev.cta, Some(cta)));
            }
        }

        if let Some(cta) = removed.cta
            && !removed.e
            && let Some(next) = timeline.get_mut(index)
        {
            next_cta = Some(mem::replace(&mut next.cta, Some(cta)));
        }

        self.undo = Some(RemoveUndo {
            removed,
            propagated_end,
            prev_cta,
            next_cta,
        });
        Ok(true)
    }

    fn revert(&mut self, document: &mut Document) -> CommandResult {
        let (hotspot, index) = (self.hotspot, self.index);
        let Some(undo) = self.undo.as_ref() else {
            return Err(not_applied("RemoveKeyframe"));
        };
        let timeline = timeline_mut(document, hotspot)?;
        if index > timeline.len() {
            return Err(CommandError::InsertOutOfBounds {
                hotspot,
                index,
                len: timeline.len(),
            });
        }
        if undo.next_cta.is_some() {
            check_keyframe(timeline, hotspot, index)?;
        }
        if (undo.prev_cta.is_some() || undo.propagated_end) && index == 0 {
            return Err(CommandError::InvalidState(
                "RemoveKeyframe payload refers to a missing predecessor".to_string(),
            ));
        }

        let Some(undo) = self.undo.take() else {
            return Err(not_applied("RemoveKeyframe"));
        };

        if let Some(cta) = undo.next_cta
            && let Some(next) = timeline.get_mut(index)
        {
            next.cta = cta;
        }
        if let Some(prev) = index.checked_sub(1).and_then(|i| timeline.get_mut(i)) {
            if let Some(cta) = undo.prev_cta {
                prev.cta = cta;
            }
            if undo.propagated_end {
                prev.e = false;
            }
        }
        timeline.insert(index, undo.removed);
        Ok(true)
    }

    fn kind(&self) -> CommandKind {
        CommandKind::RemoveKeyframe
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn target(&self) -> Option<HotspotId> {
        Some(self.hotspot)
    }

    impl_any!();

    fn debug_name(&self) -> &'static str {
        "RemoveKeyframe"
    }
}

// ============================================================================
// Value swaps
// ============================================================================

/// Change a keyframe's marker position.
#[derive(Debug, Clone)]
pub struct MoveKeyframePosition {
    hotspot: HotspotId,
    index: usize,
    old: Point,
    new: Point,
    metadata: CommandMetadata,
}

impl MoveKeyframePosition {
    /// Create the command. `old` is the position at press time.
    #[must_use]
    pub fn new(hotspot: HotspotId, index: usize, old: Point, new: Point) -> Self {
        Self {
            hotspot,
            index,
            old,
            new,
            metadata: CommandMetadata::new("Move keyframe"),
        }
    }

    fn set(&self, document: &mut Document, value: Point) -> CommandResult {
        let timeline = timeline_mut(document, self.hotspot)?;
        check_keyframe(timeline, self.hotspot, self.index)?;
        if let Some(point) = timeline.get_mut(self.index) {
            point.p = value;
        }
        Ok(true)
    }
}

impl UndoableCmd for MoveKeyframePosition {
    fn apply(&mut self, document: &mut Document) -> CommandResult {
        self.set(document, self.new)
    }

    fn revert(&mut self, document: &mut Document) -> CommandResult {
        self.set(document, self.old)
    }

    fn kind(&self) -> CommandKind {
        CommandKind::MoveKeyframePosition
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn target(&self) -> Option<HotspotId> {
        Some(self.hotspot)
    }

    impl_any!();

    fn debug_name(&self) -> &'static str {
        "MoveKeyframePosition"
    }
}

/// Change (or clear) a keyframe's CTA override.
#[derive(Debug, Clone)]
pub struct MoveKeyframeCta {
    hotspot: HotspotId,
    index: usize,
    old: Option<Point>,
    new: Option<Point>,
    metadata: CommandMetadata,
}

impl MoveKeyframeCta {
    /// Create the command.
    #[must_use]
    pub fn new(hotspot: HotspotId, index: usize, old: Option<Point>, new: Option<Point>) -> Self {
        Self {
            hotspot,
            index,
            old,
            new,
            metadata: CommandMetadata::new("Move call to action"),
        }
    }

    fn set(&self, document: &mut Document, value: Option<Point>) -> CommandResult {
        let timeline = timeline_mut(document, self.hotspot)?;
        check_keyframe(timeline, self.hotspot, self.index)?;
        if let Some(point) = timeline.get_mut(self.index) {
            point.cta = value;
        }
        Ok(true)
    }
}

impl UndoableCmd for MoveKeyframeCta {
    fn apply(&mut self, document: &mut Document) -> CommandResult {
        self.set(document, self.new)
    }

    fn revert(&mut self, document: &mut Document) -> CommandResult {
        self.set(document, self.old)
    }

    fn kind(&self) -> CommandKind {
        CommandKind::MoveKeyframeCta
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn target(&self) -> Option<HotspotId> {
        Some(self.hotspot)
    }

    impl_any!();

    fn debug_name(&self) -> &'static str {
        "MoveKeyframeCta"
    }
}

/// Retime a keyframe.
///
/// Callers clamp `new_t` with [`hotspot_core::Timeline::retime_bounds`];
/// a time outside the neighbours is rejected with
/// [`CommandError::OrderViolation`] rather than re-sorting.
#[derive(Debug, Clone)]
pub struct MoveKeyframe {
    hotspot: HotspotId,
    index: usize,
    old_t: f64,
    new_t: f64,
    metadata: CommandMetadata,
}

impl MoveKeyframe {
    /// Create the command.
    #[must_use]
    pub fn new(hotspot: HotspotId, index: usize, old_t: f64, new_t: f64) -> Self {
        Self {
            hotspot,
            index,
            old_t,
            new_t,
            metadata: CommandMetadata::new("Retime keyframe"),
        }
    }

    fn set(&self, document: &mut Document, time: f64) -> CommandResult {
        let timeline = timeline_mut(document, self.hotspot)?;
        check_keyframe(timeline, self.hotspot, self.index)?;
        check_order(timeline, self.hotspot, self.index, time, true)?;
        if let Some(point) = timeline.get_mut(self.index) {
            point.t = time;
        }
        Ok(true)
    }
}

impl UndoableCmd for MoveKeyframe {
    fn apply(&mut self, document: &mut Document) -> CommandResult {
        self.set(document, self.new_t)
    }

    fn revert(&mut self, document: &mut Document) -> CommandResult {
        self.set(document, self.old_t)
    }

    fn kind(&self) -> CommandKind {
        CommandKind::MoveKeyframe
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn target(&self) -> Option<HotspotId> {
        Some(self.hotspot)
    }

    impl_any!();

    fn debug_name(&self) -> &'static str {
        "MoveKeyframe"
    }
}

// ============================================================================
// ToggleKeyframeEnd
// ============================================================================

/// What the first `apply` of a [`ToggleKeyframeEnd`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleDirection {
    /// Set the end flag (open a visibility gap).
    On,
    /// Cleared the end flag (close the gap).
    Off,
}

impl ToggleDirection {
    fn end_after_apply(self) -> bool {
        self == Self::On
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TogglePayload {
    direction: ToggleDirection,
    /// Following keyframe's CTA `(before, after)` apply; `None` when the
    /// toggled keyframe is the last one.
    next_cta: Option<(Option<Point>, Option<Point>)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ToggleState {
    Pending,
    Applied(TogglePayload),
    Reverted(TogglePayload),
}

/// Flip a keyframe's end flag.
///
/// Turning the flag on anchors the following keyframe's CTA (a gap forces
/// the next visible segment to carry its own anchor); turning it off clears
/// that anchor. The first `apply` decides the direction and captures the
/// following CTA; later `revert`/`apply` calls replay that payload exactly.
#[derive(Debug, Clone)]
pub struct ToggleKeyframeEnd {
    hotspot: HotspotId,
    index: usize,
    default_cta: Point,
    state: ToggleState,
    metadata: CommandMetadata,
}

impl ToggleKeyframeEnd {
    /// Create the command.
    #[must_use]
    pub fn new(hotspot: HotspotId, index: usize) -> Self {
        Self {
            hotspot,
            index,
            default_cta: hotspot_core::DEFAULT_CTA,
            state: ToggleState::Pending,
            metadata: CommandMetadata::new("Toggle keyframe end"),
        }
    }

    /// CTA anchor given to the following keyframe when turning on.
    #[must_use]
    pub fn with_default_cta(mut self, cta: Point) -> Self {
        self.default_cta = cta;
        self
    }

    /// Direction chosen by the first `apply`, if it has run.
    #[must_use]
    pub fn direction(&self) -> Option<ToggleDirection> {
        match self.state {
            ToggleState::Pending => None,
            ToggleState::Applied(payload) | ToggleState::Reverted(payload) => {
                Some(payload.direction)
            }
        }
    }

    fn check_shape(
        &self,
        timeline: &Timeline,
        payload: &TogglePayload,
        expected_end: bool,
    ) -> CommandResult<()> {
        check_keyframe(timeline, self.hotspot, self.index)?;
        let has_next = self.index + 1 < timeline.len();
        let end = timeline.get(self.index).is_some_and(|p| p.e);
        if end != expected_end || has_next != payload.next_cta.is_some() {
            return Err(CommandError::InvalidState(format!(
                "keyframe {} changed since ToggleKeyframeEnd was applied",
                self.index
            )));
        }
        Ok(())
    }
}

impl UndoableCmd for ToggleKeyframeEnd {
    fn apply(&mut self, document: &mut Document) -> CommandResult {
        let (hotspot, index) = (self.hotspot, self.index);
        let timeline = timeline_mut(document, hotspot)?;

        let payload = match self.state {
            ToggleState::Applied(_) => {
                return Err(CommandError::InvalidState(
                    "ToggleKeyframeEnd is already applied".to_string(),
                ));
            }
            ToggleState::Reverted(payload) => {
                self.check_shape(timeline, &payload, !payload.direction.end_after_apply())?;
                payload
            }
            ToggleState::Pending => {
                check_keyframe(timeline, hotspot, index)?;
                let end = timeline.get(index).is_some_and(|p| p.e);
                let direction = if end {
                    ToggleDirection::Off
                } else {
                    ToggleDirection::On
                };
                let next_cta = timeline.get(index + 1).map(|next| {
                    let after = match direction {
                        ToggleDirection::On => Some(next.cta.unwrap_or(self.default_cta)),
                        ToggleDirection::Off => None,
                    };
                    (next.cta, after)
                });
                TogglePayload {
                    direction,
                    next_cta,
                }
            }
        };

        if let Some(point) = timeline.get_mut(index) {
            point.e = payload.direction.end_after_apply();
        }
        if let Some((_, after)) = payload.next_cta
            && let Some(next) = timeline.get_mut(index + 1)
        {
            next.cta = after;
        }

        self.state = ToggleState::Applied(payload);
        Ok(true)
    }

    fn revert(&mut self, document: &mut Document) -> CommandResult {
        let ToggleState::Applied(payload) = self.state else {
            return Err(not_applied("ToggleKeyframeEnd"));
        };
        let timeline = timeline_mut(document, self.hotspot)?;
        self.check_shape(timeline, &payload, payload.direction.end_after_apply())?;

        if let Some(point) = timeline.get_mut(self.index) {
            point.e = !payload.direction.end_after_apply();
        }
        if let Some((before, _)) = payload.next_cta
            && let Some(next) = timeline.get_mut(self.index + 1)
        {
            next.cta = before;
        }

        self.state = ToggleState::Reverted(payload);
        Ok(true)
    }

    fn kind(&self) -> CommandKind {
        CommandKind::ToggleKeyframeEnd
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn target(&self) -> Option<HotspotId> {
        Some(self.hotspot)
    }

    impl_any!();

    fn debug_name(&self) -> &'static str {
        "ToggleKeyframeEnd"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_core::Hotspot;

    fn tp(t: f64) -> TimePoint {
        TimePoint::new(t, Point::new(t / 10.0, t / 10.0))
    }

    fn doc_with(points: Vec<TimePoint>) -> (Document, HotspotId) {
        let mut doc = Document::default();
        let id = doc.push(
            Hotspot::new("a", ".a").with_timeline(Timeline::from_points(points).unwrap()),
        );
        (doc, id)
    }

    fn points(doc: &Document, id: HotspotId) -> Vec<TimePoint> {
        doc.get(id).unwrap().timeline.points().to_vec()
    }

    fn round_trip(cmd: &mut dyn UndoableCmd, doc: &mut Document) {
        let before = doc.clone();
        assert!(cmd.apply(doc).unwrap());
        let applied = doc.clone();
        assert!(cmd.revert(doc).unwrap());
        assert_eq!(*doc, before);
        assert!(cmd.redo(doc).unwrap());
        assert_eq!(*doc, applied);
    }

    #[test]
    fn add_clears_predecessor_end() {
        let (mut doc, id) = doc_with(vec![tp(0.0).with_end(true), tp(4.0)]);
        let mut cmd = AddKeyframe::new(id, tp(2.0), 1);
        cmd.apply(&mut doc).unwrap();
        let pts = points(&doc, id);
        assert!(!pts[0].e);
        assert_eq!(pts[1].t, 2.0);

        cmd.revert(&mut doc).unwrap();
        assert!(points(&doc, id)[0].e);
    }

    #[test]
    fn add_inherits_cta_from_following_keyframe() {
        let cta = Point::new(0.2, 0.3);
        let (mut doc, id) = doc_with(vec![tp(0.0), tp(4.0).with_cta(cta)]);
        let mut cmd = AddKeyframe::new(id, tp(2.0), 1);
        cmd.apply(&mut doc).unwrap();
        let pts = points(&doc, id);
        assert_eq!(pts[1].cta, Some(cta));
        assert_eq!(pts[2].cta, None);

        cmd.revert(&mut doc).unwrap();
        let pts = points(&doc, id);
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[1].cta, Some(cta));
        assert_eq!(cmd.point().cta, None);
    }

    #[test]
    fn add_round_trips() {
        let (mut doc, id) = doc_with(vec![
            tp(0.0).with_end(true),
            tp(4.0).with_cta(Point::new(0.9, 0.1)),
        ]);
        round_trip(&mut AddKeyframe::new(id, tp(2.0), 1), &mut doc);
    }

    #[test]
    fn add_redo_keeps_edits_made_after_insert() {
        let (mut doc, id) = doc_with(vec![tp(0.0)]);
        let mut cmd = AddKeyframe::new(id, tp(1.0), 1);
        cmd.apply(&mut doc).unwrap();
        doc.get_mut(id).unwrap().timeline.get_mut(1).unwrap().p = Point::new(0.7, 0.7);
        cmd.revert(&mut doc).unwrap();
        cmd.redo(&mut doc).unwrap();
        assert_eq!(points(&doc, id)[1].p, Point::new(0.7, 0.7));
    }

    #[test]
    fn add_rejects_out_of_order_and_out_of_bounds() {
        let (mut doc, id) = doc_with(vec![tp(1.0), tp(2.0)]);
        let before = doc.clone();
        let err = AddKeyframe::new(id, tp(3.0), 1).apply(&mut doc).unwrap_err();
        assert!(matches!(err, CommandError::OrderViolation { index: 1, .. }));
        let err = AddKeyframe::new(id, tp(3.0), 5).apply(&mut doc).unwrap_err();
        assert!(matches!(err, CommandError::InsertOutOfBounds { index: 5, len: 2, .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn revert_before_apply_is_invalid() {
        let (mut doc, id) = doc_with(vec![tp(1.0)]);
        let err = AddKeyframe::new(id, tp(2.0), 1).revert(&mut doc).unwrap_err();
        assert!(matches!(err, CommandError::InvalidState(_)));
        let err = RemoveKeyframe::new(id, 0).revert(&mut doc).unwrap_err();
        assert!(matches!(err, CommandError::InvalidState(_)));
    }

    #[test]
    fn remove_propagates_end_flag() {
        let (mut doc, id) = doc_with(vec![tp(0.0), tp(1.0).with_end(true), tp(3.0)]);
        let mut cmd = RemoveKeyframe::new(id, 1);
        cmd.apply(&mut doc).unwrap();
        let pts = points(&doc, id);
        assert_eq!(pts.len(), 2);
        assert!(pts[0].e);
        round_trip_after_revert(&mut cmd, &mut doc);
    }

    fn round_trip_after_revert(cmd: &mut dyn UndoableCmd, doc: &mut Document) {
        cmd.revert(doc).unwrap();
        round_trip(cmd, doc);
    }

    #[test]
    fn remove_hands_cta_to_neighbours() {
        let cta = Point::new(0.3, 0.6);
        let (mut doc, id) = doc_with(vec![tp(0.0), tp(1.0).with_cta(cta), tp(2.0)]);
        let before = doc.clone();
        let mut cmd = RemoveKeyframe::new(id, 1);
        cmd.apply(&mut doc).unwrap();
        let pts = points(&doc, id);
        assert_eq!(pts[0].cta, Some(cta));
        assert_eq!(pts[1].cta, Some(cta));

        cmd.revert(&mut doc).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn remove_skips_cta_handoff_to_end_predecessor() {
        let cta = Point::new(0.3, 0.6);
        let (mut doc, id) = doc_with(vec![tp(0.0).with_end(true), tp(1.0).with_cta(cta), tp(2.0)]);
        let mut cmd = RemoveKeyframe::new(id, 1);
        cmd.apply(&mut doc).unwrap();
        let pts = points(&doc, id);
        assert_eq!(pts[0].cta, None);
        assert_eq!(pts[1].cta, Some(cta));
    }

    #[test]
    fn remove_last_and_only_round_trip() {
        let (mut doc, id) = doc_with(vec![tp(0.0).with_cta(Point::CENTER).with_end(true)]);
        round_trip(&mut RemoveKeyframe::new(id, 0), &mut doc);
    }

    #[test]
    fn swaps_round_trip() {
        let (mut doc, id) = doc_with(vec![tp(0.0), tp(1.0), tp(2.0)]);
        round_trip(
            &mut MoveKeyframePosition::new(id, 1, Point::new(0.1, 0.1), Point::new(0.5, 0.9)),
            &mut doc,
        );
        round_trip(&mut MoveKeyframeCta::new(id, 1, None, Some(Point::CENTER)), &mut doc);
        round_trip(&mut MoveKeyframe::new(id, 1, 1.0, 1.5), &mut doc);
    }

    #[test]
    fn retime_rejects_crossing_a_neighbour() {
        let (mut doc, id) = doc_with(vec![tp(0.0), tp(1.0), tp(2.0)]);
        let err = MoveKeyframe::new(id, 1, 1.0, 2.5).apply(&mut doc).unwrap_err();
        assert!(matches!(err, CommandError::OrderViolation { index: 1, .. }));
        assert_eq!(points(&doc, id)[1].t, 1.0);
    }

    #[test]
    fn toggle_on_anchors_next_cta() {
        let (mut doc, id) = doc_with(vec![tp(0.0), tp(2.0)]);
        let mut cmd = ToggleKeyframeEnd::new(id, 0);
        cmd.apply(&mut doc).unwrap();
        assert_eq!(cmd.direction(), Some(ToggleDirection::On));
        let pts = points(&doc, id);
        assert!(pts[0].e);
        assert_eq!(pts[1].cta, Some(hotspot_core::DEFAULT_CTA));

        cmd.revert(&mut doc).unwrap();
        let pts = points(&doc, id);
        assert!(!pts[0].e);
        assert_eq!(pts[1].cta, None);
    }

    #[test]
    fn toggle_on_keeps_existing_next_cta() {
        let cta = Point::new(0.1, 0.2);
        let (mut doc, id) = doc_with(vec![tp(0.0), tp(2.0).with_cta(cta)]);
        ToggleKeyframeEnd::new(id, 0).apply(&mut doc).unwrap();
        assert_eq!(points(&doc, id)[1].cta, Some(cta));
    }

    #[test]
    fn toggle_off_clears_and_restores_next_cta() {
        let cta = Point::new(0.1, 0.2);
        let (mut doc, id) = doc_with(vec![tp(0.0).with_end(true), tp(2.0).with_cta(cta)]);
        let mut cmd = ToggleKeyframeEnd::new(id, 0);
        cmd.apply(&mut doc).unwrap();
        assert_eq!(cmd.direction(), Some(ToggleDirection::Off));
        assert_eq!(points(&doc, id)[1].cta, None);

        round_trip_after_revert(&mut cmd, &mut doc);
        cmd.revert(&mut doc).unwrap();
        assert_eq!(points(&doc, id)[1].cta, Some(cta));
        assert!(points(&doc, id)[0].e);
    }

    #[test]
    fn toggle_detects_drift() {
        let (mut doc, id) = doc_with(vec![tp(0.0), tp(2.0)]);
        let mut cmd = ToggleKeyframeEnd::new(id, 0);
        cmd.apply(&mut doc).unwrap();
        doc.get_mut(id).unwrap().timeline.get_mut(0).unwrap().e = false;
        assert!(matches!(cmd.revert(&mut doc), Err(CommandError::InvalidState(_))));
        assert!(matches!(cmd.apply(&mut doc), Err(CommandError::InvalidState(_))));
    }

    #[test]
    fn commands_report_missing_hotspot() {
        let (mut doc, id) = doc_with(vec![tp(0.0)]);
        doc.remove(id);
        let err = MoveKeyframeCta::new(id, 0, None, None).apply(&mut doc).unwrap_err();
        assert_eq!(err, CommandError::HotspotNotFound(id));
    }
}
