#![forbid(unsafe_code)]

//! Keyframe timeline for a single hotspot.
//!
//! A [`Timeline`] is a sparse, user-edited list of [`TimePoint`]s. Between two
//! keyframes the hotspot position is linearly interpolated; after the last one
//! it holds still. A keyframe with the end flag (`e`) opens a visibility gap
//! that lasts until the next keyframe is reached.
//!
//! ```text
//!   t:   0.0          2.0 (e)        4.0          6.0
//!        ●────lerp────●   (hidden)   ●────lerp────●═══held═══▶
//! ```
//!
//! # Invariants
//!
//! 1. Keyframe times are strictly ascending. Editing code additionally keeps
//!    them unique at frame granularity (see [`Timeline::is_well_formed`]).
//! 2. Every query here is pure: `(timeline, time, fps)` in, value out.
//! 3. A query time exactly on an `e` keyframe is visible; the gap covers
//!    `(e.t, next.t)` and closes inclusively at `next.t`.
//!
//! # Failure Modes
//!
//! - NaN query times match no keyframe and are reported as invisible.
//! - Stored documents with unsorted points can still be loaded through
//!   [`Timeline::from_points_unchecked`]; interpolation then degrades but
//!   never panics.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::quantize::FrameRate;

/// CTA position used when no keyframe anchors one.
///
/// Only reachable for a timeline whose first visible segment lacks a CTA
/// anchor. Whether the original editor intended this or merely guarded
/// against corrupt data is unverified; it is kept as a documented default.
pub const DEFAULT_CTA: Point = Point::CENTER;

/// Smallest gap kept between neighbours when retiming without a known frame
/// rate.
const MIN_RETIME_STEP: f64 = 1e-3;

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single keyframe.
///
/// Field names are the stored document format and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    /// Keyframe time in seconds.
    pub t: f64,
    /// Hotspot marker position at `t`.
    pub p: Point,
    /// Call-to-action marker position, active from `t` until superseded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<Point>,
    /// Hide the hotspot after `t` until the next keyframe.
    #[serde(default, skip_serializing_if = "is_false")]
    pub e: bool,
}

impl TimePoint {
    /// Create a visible keyframe without a CTA override.
    #[must_use]
    pub fn new(t: f64, p: Point) -> Self {
        Self {
            t,
            p,
            cta: None,
            e: false,
        }
    }

    /// Set the CTA override (builder pattern).
    #[must_use]
    pub fn with_cta(mut self, cta: Point) -> Self {
        self.cta = Some(cta);
        self
    }

    /// Set the end flag (builder pattern).
    #[must_use]
    pub fn with_end(mut self, e: bool) -> Self {
        self.e = e;
        self
    }
}

/// Result of [`Timeline::find_nearest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nearest {
    /// Matching keyframe, or the latest keyframe before the query time.
    /// `None` when no keyframe precedes the query time.
    pub index: Option<usize>,
    /// The query time falls on `index` once quantized.
    pub exact: bool,
}

impl Nearest {
    /// Where a new keyframe for the query time belongs.
    ///
    /// Only meaningful when `exact` is false: directly after `index`.
    #[must_use]
    pub fn insertion_index(self) -> usize {
        self.index.map_or(0, |i| i + 1)
    }
}

/// Errors from building a timeline out of raw points.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineError {
    /// `points[index].t` is not after `points[index - 1].t`.
    Unsorted { index: usize },
    /// `points[index].t` is NaN or infinite.
    NonFinite { index: usize },
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsorted { index } => {
                write!(f, "keyframe {index} is not after its predecessor")
            }
            Self::NonFinite { index } => write!(f, "keyframe {index} has a non-finite time"),
        }
    }
}

impl std::error::Error for TimelineError {}

/// Ordered keyframes of one hotspot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    points: Vec<TimePoint>,
}

// ---------------------------------------------------------------------------
// Construction and structural access
// ---------------------------------------------------------------------------

impl Timeline {
    /// Create an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline, rejecting unsorted or non-finite times.
    pub fn from_points(points: Vec<TimePoint>) -> Result<Self, TimelineError> {
        for (index, point) in points.iter().enumerate() {
            if !point.t.is_finite() {
                return Err(TimelineError::NonFinite { index });
            }
            if index > 0 && points[index - 1].t >= point.t {
                return Err(TimelineError::Unsorted { index });
            }
        }
        Ok(Self { points })
    }

    /// Build a timeline from points already known to be ordered.
    #[must_use]
    pub fn from_points_unchecked(points: Vec<TimePoint>) -> Self {
        Self { points }
    }

    /// All keyframes in time order.
    #[must_use]
    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    /// Number of keyframes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no keyframes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keyframe at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TimePoint> {
        self.points.get(index)
    }

    /// Mutable keyframe at `index`.
    ///
    /// Callers that change `t` must keep the ordering invariant themselves.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut TimePoint> {
        self.points.get_mut(index)
    }

    /// Insert a keyframe at `index`, shifting later keyframes.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, point: TimePoint) {
        self.points.insert(index, point);
    }

    /// Remove and return the keyframe at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> TimePoint {
        self.points.remove(index)
    }

    /// Whether times are strictly ascending once quantized to `fps`.
    #[must_use]
    pub fn is_well_formed(&self, fps: FrameRate) -> bool {
        self.points
            .windows(2)
            .all(|w| w[0].t < w[1].t && fps.quantize(w[0].t) < fps.quantize(w[1].t))
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Timeline {
    /// Index of the latest keyframe with `t <= time`.
    fn bracket(&self, time: f64) -> Option<usize> {
        self.points
            .partition_point(|point| point.t <= time)
            .checked_sub(1)
    }

    /// Interpolated hotspot position at `time`, or `None` when hidden.
    ///
    /// Hidden means: no keyframes, `time` before the first keyframe, or
    /// `time` inside the gap opened by an `e` keyframe. After the last
    /// keyframe its position is held unless it carries `e`.
    #[must_use]
    pub fn position(&self, time: f64) -> Option<Point> {
        let index = self.bracket(time)?;
        let prev = &self.points[index];

        if prev.e && time > prev.t {
            return None;
        }

        match self.points.get(index + 1) {
            None => Some(prev.p),
            Some(next) => {
                let fac = (time - prev.t) / (next.t - prev.t);
                Some(prev.p.lerp(next.p, fac))
            }
        }
    }

    /// Whether the hotspot is drawn at `time`.
    #[must_use]
    pub fn is_visible(&self, time: f64) -> bool {
        self.position(time).is_some()
    }

    /// CTA override active at `time`: the latest keyframe at or before
    /// `time` that sets one.
    #[must_use]
    pub fn cta_anchor(&self, time: f64) -> Option<Point> {
        self.points
            .iter()
            .rev()
            .filter(|point| point.t <= time)
            .find_map(|point| point.cta)
    }

    /// CTA position at `time`, falling back to [`DEFAULT_CTA`].
    #[must_use]
    pub fn cta_position(&self, time: f64) -> Point {
        self.cta_position_or(time, DEFAULT_CTA)
    }

    /// CTA position at `time` with an explicit fallback.
    #[must_use]
    pub fn cta_position_or(&self, time: f64, fallback: Point) -> Point {
        self.cta_anchor(time).unwrap_or(fallback)
    }

    /// Decide whether `time` lands on an existing keyframe.
    ///
    /// Scans from the last keyframe backwards. The first keyframe that is
    /// frame-equal to `time` is an exact match; otherwise the first keyframe
    /// strictly before `time` is returned as the insertion anchor.
    #[must_use]
    pub fn find_nearest(&self, time: f64, fps: FrameRate) -> Nearest {
        for (index, point) in self.points.iter().enumerate().rev() {
            if fps.quantize_equal(point.t, time) {
                return Nearest {
                    index: Some(index),
                    exact: true,
                };
            }
            if point.t < time {
                return Nearest {
                    index: Some(index),
                    exact: false,
                };
            }
        }
        Nearest {
            index: None,
            exact: false,
        }
    }

    /// The last keyframe that is frame-equal to `time`.
    #[must_use]
    pub fn exact_index(&self, time: f64, fps: FrameRate) -> Option<usize> {
        self.points
            .iter()
            .rposition(|point| fps.quantize_equal(point.t, time))
    }

    /// Time of the latest keyframe before `time` that is not on the same
    /// frame as `time`.
    #[must_use]
    pub fn previous_keyframe_time(&self, time: f64, fps: FrameRate) -> Option<f64> {
        self.points
            .iter()
            .rev()
            .find(|point| time > point.t && !fps.quantize_equal(point.t, time))
            .map(|point| point.t)
    }

    /// Time of the earliest keyframe after `time` that is not on the same
    /// frame as `time`.
    #[must_use]
    pub fn next_keyframe_time(&self, time: f64, fps: FrameRate) -> Option<f64> {
        self.points
            .iter()
            .find(|point| time < point.t && !fps.quantize_equal(point.t, time))
            .map(|point| point.t)
    }

    /// Keyframe that owns the CTA for the visible segment containing `time`.
    ///
    /// A segment starts at the first keyframe or right after an `e` keyframe.
    /// Returns `None` when no keyframe is at or before `time`.
    #[must_use]
    pub fn cta_owner_index(&self, time: f64) -> Option<usize> {
        let last = self.bracket(time)?;
        (0..=last)
            .rev()
            .find(|&index| index == 0 || self.points[index - 1].e)
    }

    /// Allowed times for keyframe `index` when dragged along the time axis.
    ///
    /// Neighbours are kept one frame away so the strict ordering survives
    /// quantization. The first keyframe may reach `0`, the last `duration`.
    /// When neighbours are too close to leave any room the keyframe's own
    /// time is the only allowed value.
    #[must_use]
    pub fn retime_bounds(&self, index: usize, fps: FrameRate, duration: f64) -> Option<(f64, f64)> {
        let point = self.points.get(index)?;
        let step = fps.frame_duration().unwrap_or(MIN_RETIME_STEP);

        let min = match index.checked_sub(1) {
            Some(prev) => self.points[prev].t + step,
            None => 0.0,
        };
        let max = match self.points.get(index + 1) {
            Some(next) => next.t - step,
            None => duration,
        };

        if min > max {
            Some((point.t, point.t))
        } else {
            Some((min, max))
        }
    }

    /// Keyframes to draw for the window `[start, end]` (seconds).
    ///
    /// Includes the keyframe just before the window so the leading segment
    /// can be drawn. With nothing inside the window, only the last keyframe
    /// is returned.
    #[must_use]
    pub fn visible_range(&self, start: f64, end: f64) -> Range<usize> {
        let inside = |point: &TimePoint| point.t >= start && point.t <= end;
        let first = self.points.iter().position(inside);
        let last = self.points.iter().rposition(inside);

        match (first, last) {
            (Some(first), Some(last)) => first.saturating_sub(1)..last + 1,
            _ if !self.points.is_empty() => self.points.len() - 1..self.points.len(),
            _ => 0..0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(t: f64, x: f64, y: f64) -> TimePoint {
        TimePoint::new(t, Point::new(x, y))
    }

    fn timeline(points: Vec<TimePoint>) -> Timeline {
        Timeline::from_points(points).unwrap()
    }

    #[test]
    fn from_points_rejects_unsorted() {
        let err = Timeline::from_points(vec![tp(1.0, 0.0, 0.0), tp(1.0, 0.0, 0.0)]).unwrap_err();
        assert_eq!(err, TimelineError::Unsorted { index: 1 });
        let err = Timeline::from_points(vec![tp(f64::NAN, 0.0, 0.0)]).unwrap_err();
        assert_eq!(err, TimelineError::NonFinite { index: 0 });
    }

    #[test]
    fn position_empty_is_hidden() {
        assert_eq!(Timeline::new().position(0.0), None);
    }

    #[test]
    fn position_nan_is_hidden() {
        let tl = timeline(vec![tp(0.0, 0.0, 0.0)]);
        assert_eq!(tl.position(f64::NAN), None);
    }

    #[test]
    fn position_on_end_keyframe_is_visible() {
        let tl = timeline(vec![tp(1.0, 0.2, 0.2).with_end(true), tp(3.0, 1.0, 1.0)]);
        assert_eq!(tl.position(1.0), Some(Point::new(0.2, 0.2)));
        assert_eq!(tl.position(1.5), None);
        assert_eq!(tl.position(3.0), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn trailing_end_keyframe_hides_after_itself() {
        let tl = timeline(vec![tp(0.0, 0.0, 0.0), tp(1.0, 0.4, 0.4).with_end(true)]);
        assert_eq!(tl.position(1.0), Some(Point::new(0.4, 0.4)));
        assert_eq!(tl.position(1.01), None);
    }

    #[test]
    fn cta_anchor_scans_backwards() {
        let tl = timeline(vec![
            tp(0.0, 0.0, 0.0).with_cta(Point::new(0.1, 0.1)),
            tp(1.0, 0.0, 0.0),
            tp(2.0, 0.0, 0.0).with_cta(Point::new(0.9, 0.9)),
        ]);
        assert_eq!(tl.cta_position(1.5), Point::new(0.1, 0.1));
        assert_eq!(tl.cta_position(2.0), Point::new(0.9, 0.9));
        assert_eq!(tl.cta_position(-1.0), DEFAULT_CTA);
        assert_eq!(tl.cta_position_or(-1.0, Point::new(0.0, 1.0)), Point::new(0.0, 1.0));
    }

    #[test]
    fn find_nearest_before_first_keyframe() {
        let tl = timeline(vec![tp(2.0, 0.0, 0.0)]);
        let nearest = tl.find_nearest(1.0, FrameRate::new(30.0));
        assert_eq!(nearest, Nearest { index: None, exact: false });
        assert_eq!(nearest.insertion_index(), 0);
    }

    #[test]
    fn find_nearest_prefers_exact_on_later_keyframe() {
        // 1.99 and 2.0 are different frames at 30fps; 2.01 is the same frame as 2.0.
        let tl = timeline(vec![tp(1.0, 0.0, 0.0), tp(2.0, 0.0, 0.0)]);
        let fps = FrameRate::new(30.0);
        assert_eq!(tl.find_nearest(2.01, fps), Nearest { index: Some(1), exact: true });
        assert_eq!(tl.find_nearest(1.9, fps), Nearest { index: Some(0), exact: false });
        assert_eq!(tl.find_nearest(5.0, fps).insertion_index(), 2);
    }

    #[test]
    fn seek_targets_skip_current_frame() {
        let tl = timeline(vec![tp(1.0, 0.0, 0.0), tp(2.0, 0.0, 0.0), tp(3.0, 0.0, 0.0)]);
        let fps = FrameRate::new(30.0);
        assert_eq!(tl.previous_keyframe_time(2.0, fps), Some(1.0));
        assert_eq!(tl.previous_keyframe_time(2.5, fps), Some(2.0));
        assert_eq!(tl.previous_keyframe_time(1.0, fps), None);
        assert_eq!(tl.next_keyframe_time(2.0, fps), Some(3.0));
        assert_eq!(tl.next_keyframe_time(3.0, fps), None);
    }

    #[test]
    fn cta_owner_is_segment_start() {
        let tl = timeline(vec![
            tp(0.0, 0.0, 0.0),
            tp(1.0, 0.0, 0.0).with_end(true),
            tp(2.0, 0.0, 0.0),
            tp(3.0, 0.0, 0.0),
        ]);
        assert_eq!(tl.cta_owner_index(-0.5), None);
        assert_eq!(tl.cta_owner_index(0.5), Some(0));
        assert_eq!(tl.cta_owner_index(1.5), Some(0));
        assert_eq!(tl.cta_owner_index(2.0), Some(2));
        assert_eq!(tl.cta_owner_index(9.0), Some(2));
    }

    #[test]
    fn retime_bounds_keep_a_frame_between_neighbours() {
        let tl = timeline(vec![tp(1.0, 0.0, 0.0), tp(2.0, 0.0, 0.0), tp(3.0, 0.0, 0.0)]);
        let fps = FrameRate::new(10.0);
        let (min, max) = tl.retime_bounds(1, fps, 10.0).unwrap();
        assert!((min - 1.1).abs() < 1e-12);
        assert!((max - 2.9).abs() < 1e-12);
        assert_eq!(tl.retime_bounds(0, fps, 10.0).map(|b| b.0), Some(0.0));
        assert_eq!(tl.retime_bounds(2, fps, 10.0).map(|b| b.1), Some(10.0));
        assert_eq!(tl.retime_bounds(3, fps, 10.0), None);
    }

    #[test]
    fn retime_bounds_collapse_when_crowded() {
        let tl = timeline(vec![tp(1.0, 0.0, 0.0), tp(1.05, 0.0, 0.0), tp(1.1, 0.0, 0.0)]);
        assert_eq!(tl.retime_bounds(1, FrameRate::new(10.0), 5.0), Some((1.05, 1.05)));
    }

    #[test]
    fn visible_range_includes_leading_keyframe() {
        let tl = timeline(vec![
            tp(0.0, 0.0, 0.0),
            tp(5.0, 0.0, 0.0),
            tp(10.0, 0.0, 0.0),
            tp(15.0, 0.0, 0.0),
        ]);
        assert_eq!(tl.visible_range(4.0, 11.0), 0..3);
        assert_eq!(tl.visible_range(11.0, 14.0), 3..4);
        assert_eq!(Timeline::new().visible_range(0.0, 1.0), 0..0);
    }

    #[test]
    fn well_formed_requires_distinct_frames() {
        let tl = timeline(vec![tp(1.0, 0.0, 0.0), tp(1.01, 0.0, 0.0)]);
        assert!(!tl.is_well_formed(FrameRate::new(30.0)));
        assert!(tl.is_well_formed(FrameRate::UNKNOWN));
    }
}
