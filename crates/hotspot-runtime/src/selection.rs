#![forbid(unsafe_code)]

//! Selection tracking and keyboard-driven keyframe actions.
//!
//! The selected keyframe is never stored independently of time: it is
//! whatever keyframe sits on the playhead's frame of the selected hotspot.
//! Commands never touch the selection; after every history operation the
//! context re-validates it against the document (an undo may have removed
//! the selected hotspot).
//!
//! # Invariants
//!
//! 1. A selected hotspot is always present in the document.
//! 2. `keyframe()` is `Some(i)` only when keyframe `i` of the selected
//!    hotspot is frame-equal to the playhead.

use hotspot_core::{Document, FrameRate, HotspotId, Nearest, Point, TimePoint, Timeline};

use crate::context::EditingContext;
use crate::undo::{AddKeyframe, CommandResult, RemoveKeyframe};

/// Currently selected hotspot and keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    hotspot: Option<HotspotId>,
    keyframe: Option<usize>,
}

impl Selection {
    /// Selected hotspot.
    #[must_use]
    pub fn hotspot(&self) -> Option<HotspotId> {
        self.hotspot
    }

    /// Keyframe of the selected hotspot on the playhead's frame.
    #[must_use]
    pub fn keyframe(&self) -> Option<usize> {
        self.keyframe
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hotspot.is_none()
    }

    /// Select `hotspot` (or deselect with `None`).
    ///
    /// Returns `false` and leaves the selection alone when the hotspot is
    /// not in the document.
    pub fn select(
        &mut self,
        document: &Document,
        hotspot: Option<HotspotId>,
        time: f64,
        fps: FrameRate,
    ) -> bool {
        if let Some(id) = hotspot
            && !document.contains(id)
        {
            tracing::debug!(target: "hotspot.selection", hotspot = %id, "refused to select missing hotspot");
            return false;
        }
        self.hotspot = hotspot;
        self.refresh_keyframe(document, time, fps);
        true
    }

    /// Drop a selection whose hotspot is gone, then re-derive the keyframe.
    pub fn validate(&mut self, document: &Document, time: f64, fps: FrameRate) {
        if let Some(id) = self.hotspot
            && !document.contains(id)
        {
            tracing::debug!(target: "hotspot.selection", hotspot = %id, "selected hotspot removed; deselecting");
            self.clear();
            return;
        }
        self.refresh_keyframe(document, time, fps);
    }

    /// Re-derive the selected keyframe from the playhead.
    pub fn refresh_keyframe(&mut self, document: &Document, time: f64, fps: FrameRate) {
        self.keyframe = self
            .hotspot
            .and_then(|id| document.get(id))
            .and_then(|hotspot| hotspot.timeline.exact_index(time, fps));
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.hotspot = None;
        self.keyframe = None;
    }
}

/// Build the keyframe a non-exact press or keypress at `time` inserts.
///
/// A keyframe appended after the last one carries the end flag: it does not
/// extend visibility until another keyframe follows it.
pub(crate) fn keyframe_for_insert(
    timeline: &Timeline,
    time: f64,
    nearest: Nearest,
    p: Point,
) -> (usize, TimePoint) {
    let index = nearest.insertion_index();
    let point = TimePoint::new(time, p).with_end(index == timeline.len());
    (index, point)
}

// ---------------------------------------------------------------------------
// Keyboard actions
// ---------------------------------------------------------------------------

impl EditingContext {
    /// Select a hotspot (or clear with `None`). See [`Selection::select`].
    pub fn select(&mut self, hotspot: Option<HotspotId>) -> bool {
        self.selection
            .select(&self.document, hotspot, self.playhead, self.frame_rate)
    }

    /// Add a keyframe to the selected hotspot at the playhead.
    ///
    /// Does nothing when no hotspot is selected or a keyframe already sits on
    /// the playhead's frame. The new keyframe takes the interpolated
    /// position, or the configured fallback while the hotspot is hidden.
    /// Returns the inserted index.
    pub fn insert_keyframe(&mut self) -> CommandResult<Option<usize>> {
        let Some(id) = self.selection.hotspot() else {
            return Ok(None);
        };
        let Some(hotspot) = self.document.get(id) else {
            return Ok(None);
        };
        let timeline = &hotspot.timeline;
        let nearest = timeline.find_nearest(self.playhead, self.frame_rate);
        if nearest.exact {
            return Ok(None);
        }

        let p = timeline
            .position(self.playhead)
            .unwrap_or(self.config.interaction.fallback_position);
        let (index, point) = keyframe_for_insert(timeline, self.playhead, nearest, p);
        tracing::debug!(target: "hotspot.selection", hotspot = %id, index, t = point.t, "insert keyframe at playhead");
        self.run(AddKeyframe::new(id, point, index))?;
        Ok(Some(index))
    }

    /// Remove the selected hotspot's keyframe on the playhead's frame.
    ///
    /// Returns `false` when there is no such keyframe.
    pub fn delete_active_keyframe(&mut self) -> CommandResult<bool> {
        let Some(id) = self.selection.hotspot() else {
            return Ok(false);
        };
        let nearest = self
            .document
            .get(id)
            .map(|hotspot| hotspot.timeline.find_nearest(self.playhead, self.frame_rate));
        match nearest {
            Some(Nearest {
                index: Some(index),
                exact: true,
            }) => {
                tracing::debug!(target: "hotspot.selection", hotspot = %id, index, "delete active keyframe");
                self.run(RemoveKeyframe::new(id, index))
            }
            _ => Ok(false),
        }
    }

    /// Move the playhead to the previous keyframe of the selected hotspot,
    /// or to the start when there is none.
    ///
    /// Returns the new playhead for the video collaborator to seek to;
    /// `None` when no hotspot is selected.
    pub fn seek_previous_keyframe(&mut self) -> Option<f64> {
        let timeline = &self.document.get(self.selection.hotspot()?)?.timeline;
        let target = timeline
            .previous_keyframe_time(self.playhead, self.frame_rate)
            .unwrap_or(0.0);
        self.set_playhead(target);
        Some(target)
    }

    /// Move the playhead to the next keyframe of the selected hotspot, or to
    /// the end of the video when there is none.
    pub fn seek_next_keyframe(&mut self) -> Option<f64> {
        let timeline = &self.document.get(self.selection.hotspot()?)?.timeline;
        let target = timeline
            .next_keyframe_time(self.playhead, self.frame_rate)
            .unwrap_or(self.duration);
        self.set_playhead(target);
        Some(target)
    }

    /// Step the playhead by whole frames (negative steps go back).
    pub fn step_frames(&mut self, frames: i64) -> f64 {
        let mut target = self.frame_rate.step_frames(self.playhead, frames);
        if self.duration > 0.0 {
            target = target.min(self.duration);
        }
        self.set_playhead(target);
        target
    }
}
