#![forbid(unsafe_code)]

//! Pointer interaction: turning presses and drags into commands.
//!
//! Three independent drag tracks exist:
//!
//! | Track    | Press on                 | Live edit            | Commit on release        |
//! |----------|--------------------------|----------------------|--------------------------|
//! | Position | hotspot marker           | `points[i].p`        | `MoveKeyframePosition`   |
//! | CTA      | CTA marker               | owner's `cta`        | `MoveKeyframeCta`        |
//! | Retime   | keyframe on the timeline | `points[i].t`        | `MoveKeyframe`           |
//!
//! A position press at a time with no keyframe inserts one first
//! (`AddKeyframe`) and then drags it; that drag is not committed separately
//! because the inserted keyframe is refreshed when its `AddKeyframe` is
//! reverted.
//!
//! Pixel-to-normalized conversion and time-axis layout belong to the host:
//! this module receives normalized pointer positions, the time under the
//! pointer, and the video's pixel size for hit testing.
//!
//! # Invariants
//!
//! 1. Live edits keep positions in `[0, 1]` and times inside
//!    [`hotspot_core::Timeline::retime_bounds`].
//! 2. `cancel()` restores the pre-drag value and never touches history.
//!
//! # Failure Modes
//!
//! - The dragged hotspot disappears mid-drag (removed by another view): the
//!   drag is abandoned with a warning and release reports the lookup error.

use std::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use hotspot_core::{HotspotId, Point, TimePoint};
use web_time::Instant;

use crate::context::EditingContext;
use crate::events::EditorEvent;
use crate::selection::keyframe_for_insert;
use crate::undo::{
    AddKeyframe, CommandError, CommandResult, MoveKeyframe, MoveKeyframeCta, MoveKeyframePosition,
    command::{check_keyframe, timeline_mut},
};

/// Tunables for pointer interaction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct InteractionConfig {
    /// Pointer-to-marker hit radius in video pixels.
    pub hit_radius_px: f64,
    /// Horizontal travel that turns a keyframe press into a retime drag.
    pub retime_drag_threshold_px: f64,
    /// Press duration that turns a keyframe press into a retime drag.
    pub retime_hold_ms: u64,
    /// CTA anchor used when a gap forces one and as the CTA fallback.
    pub default_cta: Point,
    /// Position for keyframes inserted while the hotspot is hidden.
    pub fallback_position: Point,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hit_radius_px: 32.0,
            retime_drag_threshold_px: 7.0,
            retime_hold_ms: 500,
            default_cta: hotspot_core::DEFAULT_CTA,
            fallback_position: Point::CENTER,
        }
    }
}

impl InteractionConfig {
    /// Hold duration as a [`Duration`].
    #[must_use]
    pub fn retime_hold(&self) -> Duration {
        Duration::from_millis(self.retime_hold_ms)
    }
}

/// Pixel size of the rendered video frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Create a viewport.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether two normalized points are within `radius_px` on screen.
    #[must_use]
    pub fn point_near(&self, a: Point, b: Point, radius_px: f64) -> bool {
        let (dx, dy) = a.delta_to(b);
        (dx * self.width).hypot(dy * self.height) < radius_px
    }
}

/// What a release did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    /// No drag was active, or the value ended where it started.
    Unchanged,
    /// A command was recorded in history.
    Committed,
    /// A keyframe inserted by the press was placed; it is already in history.
    Placed,
    /// A keyframe was clicked without dragging; the playhead moved here.
    Seek(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Position {
        hotspot: HotspotId,
        index: usize,
        origin: Point,
        offset: (f64, f64),
        created: bool,
    },
    Cta {
        hotspot: HotspotId,
        index: usize,
        old: Option<Point>,
        offset: (f64, f64),
    },
    Retime {
        hotspot: HotspotId,
        index: usize,
        start_t: f64,
        press_x: f64,
        pressed_at: Instant,
        active: bool,
    },
}

/// Drives one pointer drag at a time.
#[derive(Debug, Clone)]
pub struct DragCoordinator {
    state: DragState,
}

impl Default for DragCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl DragCoordinator {
    /// Create an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    /// Whether a press is being tracked.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Whether a keyframe press has turned into a retime drag.
    #[must_use]
    pub fn is_retiming(&self) -> bool {
        matches!(self.state, DragState::Retime { active: true, .. })
    }

    // ------------------------------------------------------------------------
    // Press
    // ------------------------------------------------------------------------

    /// Press on the video at `pointer` with `hotspot` selected.
    ///
    /// Hits when the pointer is over the hotspot marker, or always while the
    /// hotspot is hidden. On the playhead's keyframe the drag edits it;
    /// elsewhere a keyframe is inserted first. Returns whether a drag began.
    pub fn press_hotspot(
        &mut self,
        ctx: &mut EditingContext,
        hotspot: HotspotId,
        pointer: Point,
        viewport: Viewport,
    ) -> CommandResult<bool> {
        self.cancel(ctx);
        let (time, fps) = (ctx.playhead, ctx.frame_rate);
        let radius = ctx.config.interaction.hit_radius_px;

        let timeline = &ctx
            .document
            .get(hotspot)
            .ok_or(CommandError::HotspotNotFound(hotspot))?
            .timeline;
        let shown = timeline.position(time);
        if let Some(shown) = shown
            && !viewport.point_near(shown, pointer, radius)
        {
            return Ok(false);
        }
        let anchor = shown.unwrap_or(pointer);

        let nearest = timeline.find_nearest(time, fps);
        let (index, created) = match (nearest.exact, nearest.index) {
            (true, Some(index)) => (index, false),
            _ => {
                let (index, point) = keyframe_for_insert(timeline, time, nearest, anchor);
                ctx.run(AddKeyframe::new(hotspot, point, index))?;
                (index, true)
            }
        };
        ctx.select(Some(hotspot));

        let origin = keyframe(ctx, hotspot, index)?.p;
        tracing::debug!(target: "hotspot.interaction", hotspot = %hotspot, index, created, "position drag started");
        self.state = DragState::Position {
            hotspot,
            index,
            origin,
            offset: pointer.delta_to(anchor),
            created,
        };
        Ok(true)
    }

    /// Press on the CTA marker of `hotspot`.
    ///
    /// The drag edits the keyframe that owns the visible segment's CTA.
    /// Returns whether a drag began.
    pub fn press_cta(
        &mut self,
        ctx: &mut EditingContext,
        hotspot: HotspotId,
        pointer: Point,
        viewport: Viewport,
    ) -> CommandResult<bool> {
        self.cancel(ctx);
        let radius = ctx.config.interaction.hit_radius_px;
        let Some(shown) = ctx.cta_position(hotspot) else {
            return Ok(false);
        };
        if !viewport.point_near(shown, pointer, radius) {
            return Ok(false);
        }
        let timeline = &ctx
            .document
            .get(hotspot)
            .ok_or(CommandError::HotspotNotFound(hotspot))?
            .timeline;
        let Some(index) = timeline.cta_owner_index(ctx.playhead) else {
            return Ok(false);
        };
        let old = keyframe(ctx, hotspot, index)?.cta;
        ctx.select(Some(hotspot));

        tracing::debug!(target: "hotspot.interaction", hotspot = %hotspot, index, "cta drag started");
        self.state = DragState::Cta {
            hotspot,
            index,
            old,
            offset: pointer.delta_to(shown),
        };
        Ok(true)
    }

    /// Press on keyframe `index` in the timeline strip.
    ///
    /// The press becomes a retime drag after the hold time or once the
    /// pointer travels past the threshold; a release before that is a click.
    pub fn press_keyframe(
        &mut self,
        ctx: &mut EditingContext,
        hotspot: HotspotId,
        index: usize,
        pointer_x_px: f64,
        now: Instant,
    ) -> CommandResult<()> {
        self.cancel(ctx);
        let start_t = keyframe(ctx, hotspot, index)?.t;
        ctx.select(Some(hotspot));
        self.state = DragState::Retime {
            hotspot,
            index,
            start_t,
            press_x: pointer_x_px,
            pressed_at: now,
            active: false,
        };
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Move
    // ------------------------------------------------------------------------

    /// Follow the pointer for a position or CTA drag.
    pub fn drag_to(&mut self, ctx: &mut EditingContext, pointer: Point) {
        let result = match self.state {
            DragState::Position {
                hotspot,
                index,
                offset,
                ..
            } => {
                let p = pointer.offset(offset.0, offset.1).clamp_unit();
                edit_keyframe(ctx, hotspot, index, |point| point.p = p)
            }
            DragState::Cta {
                hotspot,
                index,
                offset,
                ..
            } => {
                let cta = pointer.offset(offset.0, offset.1).clamp_unit();
                edit_keyframe(ctx, hotspot, index, |point| point.cta = Some(cta))
            }
            DragState::Idle | DragState::Retime { .. } => return,
        };
        if let Err(err) = result {
            self.abandon(&err);
        }
    }

    /// Follow the pointer for a keyframe press in the timeline strip.
    ///
    /// `time_at_pointer` is the video time under the pointer.
    pub fn drag_time(
        &mut self,
        ctx: &mut EditingContext,
        pointer_x_px: f64,
        time_at_pointer: f64,
        now: Instant,
    ) {
        let threshold = ctx.config.interaction.retime_drag_threshold_px;
        let hold = ctx.config.interaction.retime_hold();
        let DragState::Retime {
            hotspot,
            index,
            press_x,
            pressed_at,
            ref mut active,
            ..
        } = self.state
        else {
            return;
        };

        if !*active
            && (now.saturating_duration_since(pressed_at) >= hold
                || (pointer_x_px - press_x).abs() > threshold)
        {
            *active = true;
            tracing::debug!(target: "hotspot.interaction", hotspot = %hotspot, index, "retime drag started");
        }
        if !*active || !time_at_pointer.is_finite() {
            return;
        }

        let (fps, duration) = (ctx.frame_rate, known_duration(ctx.duration));
        let result = timeline_mut(&mut ctx.document, hotspot).and_then(|timeline| {
            let (min, max) = timeline.retime_bounds(index, fps, duration).ok_or(
                CommandError::KeyframeOutOfBounds {
                    hotspot,
                    index,
                    len: timeline.len(),
                },
            )?;
            // Stored timelines are not re-validated on load.
            if min.is_nan() || max.is_nan() || min > max {
                return Err(CommandError::InvalidState(format!(
                    "keyframe {index} has unusable retime bounds [{min}, {max}]"
                )));
            }
            if let Some(point) = timeline.get_mut(index) {
                point.t = time_at_pointer.clamp(min, max);
                tracing::trace!(target: "hotspot.interaction", index, t = point.t, "retime");
            }
            Ok(())
        });
        if let Err(err) = result {
            self.abandon(&err);
        }
    }

    /// Activate a held keyframe press once the hold time has passed.
    ///
    /// Returns whether a retime drag is active.
    pub fn tick(&mut self, ctx: &EditingContext, now: Instant) -> bool {
        let hold = ctx.config.interaction.retime_hold();
        if let DragState::Retime {
            pressed_at,
            ref mut active,
            ..
        } = self.state
            && !*active
            && now.saturating_duration_since(pressed_at) >= hold
        {
            *active = true;
        }
        self.is_retiming()
    }

    // ------------------------------------------------------------------------
    // Release / cancel
    // ------------------------------------------------------------------------

    /// Finish the current drag.
    pub fn release(&mut self, ctx: &mut EditingContext) -> CommandResult<DragOutcome> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        match state {
            DragState::Idle => Ok(DragOutcome::Unchanged),
            DragState::Position {
                hotspot,
                index,
                origin,
                created,
                ..
            } => {
                let current = keyframe(ctx, hotspot, index)?.p;
                if created {
                    ctx.events().emit(EditorEvent::DocumentChanged);
                    Ok(DragOutcome::Placed)
                } else if current != origin {
                    ctx.run(MoveKeyframePosition::new(hotspot, index, origin, current))?;
                    Ok(DragOutcome::Committed)
                } else {
                    Ok(DragOutcome::Unchanged)
                }
            }
            DragState::Cta {
                hotspot,
                index,
                old,
                ..
            } => {
                let current = keyframe(ctx, hotspot, index)?.cta;
                if current != old {
                    ctx.run(MoveKeyframeCta::new(hotspot, index, old, current))?;
                    Ok(DragOutcome::Committed)
                } else {
                    Ok(DragOutcome::Unchanged)
                }
            }
            DragState::Retime {
                hotspot,
                index,
                start_t,
                active,
                ..
            } => {
                if !active {
                    tracing::debug!(target: "hotspot.interaction", t = start_t, "keyframe clicked");
                    ctx.set_playhead(start_t);
                    return Ok(DragOutcome::Seek(start_t));
                }
                let current = keyframe(ctx, hotspot, index)?.t;
                if current != start_t {
                    ctx.run(MoveKeyframe::new(hotspot, index, start_t, current))?;
                    Ok(DragOutcome::Committed)
                } else {
                    Ok(DragOutcome::Unchanged)
                }
            }
        }
    }

    /// Abort the current drag and restore the pre-drag value.
    ///
    /// A keyframe inserted by the press stays (its `AddKeyframe` is in
    /// history); only the drag movement is undone.
    pub fn cancel(&mut self, ctx: &mut EditingContext) {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let restored = match state {
            DragState::Idle => return,
            DragState::Position {
                hotspot,
                index,
                origin,
                ..
            } => edit_keyframe(ctx, hotspot, index, |point| point.p = origin),
            DragState::Cta {
                hotspot,
                index,
                old,
                ..
            } => edit_keyframe(ctx, hotspot, index, |point| point.cta = old),
            DragState::Retime {
                hotspot,
                index,
                start_t,
                ..
            } => edit_keyframe(ctx, hotspot, index, |point| point.t = start_t),
        };
        match restored {
            Ok(()) => tracing::debug!(target: "hotspot.interaction", "drag cancelled"),
            Err(err) => tracing::warn!(target: "hotspot.interaction", error = %err, "drag cancelled on a missing keyframe"),
        }
    }

    fn abandon(&mut self, err: &CommandError) {
        tracing::warn!(target: "hotspot.interaction", error = %err, "abandoning drag");
        self.state = DragState::Idle;
    }
}

/// Last keyframe may be dragged anywhere while the duration is unknown.
fn known_duration(duration: f64) -> f64 {
    if duration > 0.0 { duration } else { f64::INFINITY }
}

fn keyframe(ctx: &EditingContext, hotspot: HotspotId, index: usize) -> CommandResult<&TimePoint> {
    let timeline = &ctx
        .document
        .get(hotspot)
        .ok_or(CommandError::HotspotNotFound(hotspot))?
        .timeline;
    timeline.get(index).ok_or(CommandError::KeyframeOutOfBounds {
        hotspot,
        index,
        len: timeline.len(),
    })
}

fn edit_keyframe(
    ctx: &mut EditingContext,
    hotspot: HotspotId,
    index: usize,
    edit: impl FnOnce(&mut TimePoint),
) -> CommandResult<()> {
    let timeline = timeline_mut(&mut ctx.document, hotspot)?;
    check_keyframe(timeline, hotspot, index)?;
    if let Some(point) = timeline.get_mut(index) {
        edit(point);
        tracing::trace!(target: "hotspot.interaction", index, "live edit");
    }
    Ok(())
}
