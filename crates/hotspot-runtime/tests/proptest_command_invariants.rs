#![forbid(unsafe_code)]

//! Property-based invariant tests for editing commands and history.
//!
//! ## Invariants
//!
//! 1. Round-trip: `apply` then `revert` restores the document exactly, and
//!    `redo` reproduces the applied state.
//! 2. Stack law: after `n` runs, `k <= n` undos and `j <= k` redos the
//!    document equals the state after the first `n - k + j` runs.
//! 3. Ordering: keyframe times stay strictly ascending after every step.
//! 4. Gap anchors: a keyframe following an end-flagged keyframe carries a
//!    CTA anchor.
//! 5. Undoing everything restores the initial document.
//! 6. Rejection: a command that fails validation (stale index, order
//!    violation) leaves the document and both history stacks untouched.
//!
//! Run:
//!   cargo test -p hotspot-runtime --test proptest_command_invariants

use hotspot_core::{CallToAction, Document, FrameRate, Hotspot, Point, TimePoint, Timeline};
use hotspot_runtime::{
    AddHotspot, AddKeyframe, HistoryConfig, HistoryManager, HotspotInfo, MoveKeyframe,
    MoveKeyframeCta, MoveKeyframePosition, RemoveHotspot, RemoveKeyframe, SetHotspotInfo,
    ToggleKeyframeEnd, UndoableCmd,
};
use proptest::prelude::*;

const FPS: FrameRate = FrameRate::new(30.0);
const DURATION: f64 = 20.0;

// ── Operations ────────────────────────────────────────────────────────────

/// An edit expressed independently of the document it lands on; `pick`
/// values select a hotspot or keyframe modulo the current count.
#[derive(Debug, Clone)]
enum Op {
    AddKeyframe { hotspot: usize, frame: u32, x: u8, y: u8 },
    RemoveKeyframe { hotspot: usize, pick: usize },
    MovePosition { hotspot: usize, pick: usize, x: u8, y: u8 },
    MoveCta { hotspot: usize, pick: usize, cta: Option<(u8, u8)> },
    Retime { hotspot: usize, pick: usize, frac: u8 },
    ToggleEnd { hotspot: usize, pick: usize },
    AddHotspot,
    RemoveHotspot { hotspot: usize },
    SetInfo { hotspot: usize, target: u8 },
    /// A command the engine must refuse; `kind` picks the failure.
    Rejected { hotspot: usize, pick: usize, kind: u8 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<usize>(), 0u32..600, any::<u8>(), any::<u8>())
            .prop_map(|(hotspot, frame, x, y)| Op::AddKeyframe { hotspot, frame, x, y }),
        2 => (any::<usize>(), any::<usize>())
            .prop_map(|(hotspot, pick)| Op::RemoveKeyframe { hotspot, pick }),
        2 => (any::<usize>(), any::<usize>(), any::<u8>(), any::<u8>())
            .prop_map(|(hotspot, pick, x, y)| Op::MovePosition { hotspot, pick, x, y }),
        2 => (any::<usize>(), any::<usize>(), proptest::option::of((any::<u8>(), any::<u8>())))
            .prop_map(|(hotspot, pick, cta)| Op::MoveCta { hotspot, pick, cta }),
        2 => (any::<usize>(), any::<usize>(), any::<u8>())
            .prop_map(|(hotspot, pick, frac)| Op::Retime { hotspot, pick, frac }),
        2 => (any::<usize>(), any::<usize>())
            .prop_map(|(hotspot, pick)| Op::ToggleEnd { hotspot, pick }),
        1 => Just(Op::AddHotspot),
        1 => any::<usize>().prop_map(|hotspot| Op::RemoveHotspot { hotspot }),
        1 => (any::<usize>(), any::<u8>()).prop_map(|(hotspot, target)| Op::SetInfo { hotspot, target }),
        1 => (any::<usize>(), any::<usize>(), 0u8..5)
            .prop_map(|(hotspot, pick, kind)| Op::Rejected { hotspot, pick, kind }),
    ]
}

fn unit(v: u8) -> f64 {
    f64::from(v) / 255.0
}

fn pick(len: usize, pick: usize) -> Option<usize> {
    (len > 0).then(|| pick % len)
}

/// Turn `op` into a command that is valid for `doc`, the way the editor
/// would. `None` when the op has nothing to act on.
fn build(op: &Op, doc: &Document) -> Option<Box<dyn UndoableCmd>> {
    let hotspot_at = |h: usize| pick(doc.len(), h).map(|i| &doc.hotspots()[i]);

    let cmd: Box<dyn UndoableCmd> = match *op {
        Op::AddKeyframe { hotspot, frame, x, y } => {
            let h = hotspot_at(hotspot)?;
            let time = (f64::from(frame) + 0.5) / 30.0;
            let nearest = h.timeline.find_nearest(time, FPS);
            if nearest.exact {
                return None;
            }
            let index = nearest.insertion_index();
            let point = TimePoint::new(time, Point::new(unit(x), unit(y)))
                .with_end(index == h.timeline.len());
            Box::new(AddKeyframe::new(h.id(), point, index))
        }
        Op::RemoveKeyframe { hotspot, pick: k } => {
            let h = hotspot_at(hotspot)?;
            Box::new(RemoveKeyframe::new(h.id(), pick(h.timeline.len(), k)?))
        }
        Op::MovePosition { hotspot, pick: k, x, y } => {
            let h = hotspot_at(hotspot)?;
            let index = pick(h.timeline.len(), k)?;
            let old = h.timeline.get(index)?.p;
            Box::new(MoveKeyframePosition::new(h.id(), index, old, Point::new(unit(x), unit(y))))
        }
        Op::MoveCta { hotspot, pick: k, cta } => {
            let h = hotspot_at(hotspot)?;
            let index = pick(h.timeline.len(), k)?;
            let old = h.timeline.get(index)?.cta;
            let new = cta.map(|(x, y)| Point::new(unit(x), unit(y)));
            // The editor never strips the anchor that opens a visible segment.
            let after_gap = index.checked_sub(1).and_then(|i| h.timeline.get(i)).is_some_and(|p| p.e);
            if new.is_none() && after_gap {
                return None;
            }
            Box::new(MoveKeyframeCta::new(h.id(), index, old, new))
        }
        Op::Retime { hotspot, pick: k, frac } => {
            let h = hotspot_at(hotspot)?;
            let index = pick(h.timeline.len(), k)?;
            let old_t = h.timeline.get(index)?.t;
            let (min, max) = h.timeline.retime_bounds(index, FPS, DURATION)?;
            let new_t = min + (max - min) * unit(frac);
            Box::new(MoveKeyframe::new(h.id(), index, old_t, new_t.clamp(min, max)))
        }
        Op::ToggleEnd { hotspot, pick: k } => {
            let h = hotspot_at(hotspot)?;
            Box::new(ToggleKeyframeEnd::new(h.id(), pick(h.timeline.len(), k)?))
        }
        Op::AddHotspot => Box::new(AddHotspot::new(
            Hotspot::new("example", ".example").with_cta(CallToAction::default()),
        )),
        Op::RemoveHotspot { hotspot } => Box::new(RemoveHotspot::new(hotspot_at(hotspot)?.id())),
        Op::SetInfo { hotspot, target } => {
            let h = hotspot_at(hotspot)?;
            let info = HotspotInfo {
                target: format!("target-{target}"),
                ..HotspotInfo::of(h)
            };
            Box::new(SetHotspotInfo::new(h.id(), info))
        }
        Op::Rejected { .. } => return None,
    };
    Some(cmd)
}

/// Command for an [`Op::Rejected`] that `doc` must refuse.
fn build_rejected(op: &Op, doc: &Document) -> Option<Box<dyn UndoableCmd>> {
    let Op::Rejected { hotspot, pick: k, kind } = *op else {
        return None;
    };
    let h = &doc.hotspots()[pick(doc.len(), hotspot)?];
    let (id, points) = (h.id(), h.timeline.points());
    let len = points.len();

    let cmd: Box<dyn UndoableCmd> = match (kind, len) {
        (1, _) => {
            let stale = len + k % 3;
            Box::new(MoveKeyframePosition::new(id, stale, Point::CENTER, Point::new(0.0, 0.0)))
        }
        (2, 1..) => {
            let index = k % len;
            Box::new(MoveKeyframe::new(id, index, points[index].t, -1.0))
        }
        (3, 2..) => {
            let index = k % (len - 1);
            Box::new(MoveKeyframe::new(id, index, points[index].t, points[index + 1].t + 1.0))
        }
        (4, 1..) => {
            let late = TimePoint::new(points[len - 1].t + 1.0, Point::CENTER);
            Box::new(AddKeyframe::new(id, late, 0))
        }
        (4, 0) => Box::new(AddKeyframe::new(id, TimePoint::new(f64::NAN, Point::CENTER), 0)),
        _ => Box::new(RemoveKeyframe::new(id, len)),
    };
    Some(cmd)
}

/// Run a command that must be refused and check nothing moved.
fn assert_rejected(
    history: &mut HistoryManager,
    doc: &mut Document,
    op: &Op,
) -> Result<(), TestCaseError> {
    let Some(cmd) = build_rejected(op, doc) else {
        return Ok(());
    };
    let name = cmd.debug_name();
    let (before, undo, redo) = (doc.clone(), history.undo_depth(), history.redo_depth());
    prop_assert!(history.run(cmd, doc).is_err(), "{} was accepted", name);
    prop_assert_eq!(&*doc, &before, "{} touched the document", name);
    prop_assert_eq!(history.undo_depth(), undo);
    prop_assert_eq!(history.redo_depth(), redo);
    Ok(())
}

// ── Strategies ────────────────────────────────────────────────────────────

/// Documents with one or two hotspots whose keyframes sit mid-frame on
/// distinct frames, no end flags.
fn arb_document() -> impl Strategy<Value = Document> {
    prop::collection::vec(prop::collection::btree_set(0u32..600, 0..8), 1..3).prop_map(
        |timelines| {
            let mut doc = Document::default();
            for (n, frames) in timelines.into_iter().enumerate() {
                let points = frames
                    .into_iter()
                    .map(|frame| {
                        let t = (f64::from(frame) + 0.5) / 30.0;
                        TimePoint::new(t, Point::new(t / DURATION, 0.5))
                    })
                    .collect();
                let timeline = Timeline::from_points_unchecked(points);
                doc.push(Hotspot::new(format!("h{n}"), format!(".h{n}")).with_timeline(timeline));
            }
            doc
        },
    )
}

fn arb_ops(max: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(arb_op(), 1..max)
}

// ── Checks ────────────────────────────────────────────────────────────────

fn check_timelines(doc: &Document) -> Result<(), TestCaseError> {
    for hotspot in doc.iter() {
        let points = hotspot.timeline.points();
        for w in points.windows(2) {
            prop_assert!(w[0].t < w[1].t, "unsorted: {:?}", points);
            if w[0].e {
                prop_assert!(w[1].cta.is_some(), "gap without anchor: {:?}", points);
            }
        }
    }
    Ok(())
}

// ── 1. Round-trip ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn every_command_round_trips(doc in arb_document(), ops in arb_ops(24)) {
        let mut doc = doc;
        for op in &ops {
            let Some(mut cmd) = build(op, &doc) else { continue };
            let before = doc.clone();
            prop_assert!(cmd.apply(&mut doc).is_ok(), "{} rejected", cmd.debug_name());
            let applied = doc.clone();

            prop_assert!(cmd.revert(&mut doc).is_ok());
            prop_assert_eq!(&doc, &before, "{} did not revert", cmd.debug_name());

            prop_assert!(cmd.redo(&mut doc).is_ok());
            prop_assert_eq!(&doc, &applied, "{} did not redo", cmd.debug_name());
            check_timelines(&doc)?;
        }
    }
}

// ── 2. Undo/redo stack law ────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn undo_redo_stack_law(
        doc in arb_document(),
        ops in arb_ops(20),
        undo_frac in 0.0f64..=1.0,
        redo_frac in 0.0f64..=1.0,
    ) {
        let mut doc = doc;
        let mut history = HistoryManager::new(HistoryConfig::unlimited());
        let mut snapshots = vec![doc.clone()];

        for op in &ops {
            assert_rejected(&mut history, &mut doc, op)?;
            let Some(cmd) = build(op, &doc) else { continue };
            history.run(cmd, &mut doc).map_err(|e| TestCaseError::fail(e.to_string()))?;
            snapshots.push(doc.clone());
        }

        let n = snapshots.len() - 1;
        let k = (n as f64 * undo_frac).floor() as usize;
        let j = (k as f64 * redo_frac).floor() as usize;

        for _ in 0..k {
            prop_assert!(matches!(history.undo(&mut doc), Some(Ok(_))));
            check_timelines(&doc)?;
        }
        // A refused command must not clear the redo stack.
        for op in &ops {
            assert_rejected(&mut history, &mut doc, op)?;
        }
        for _ in 0..j {
            prop_assert!(matches!(history.redo(&mut doc), Some(Ok(_))));
        }

        prop_assert_eq!(&doc, &snapshots[n - k + j]);
        prop_assert_eq!(history.undo_depth(), n - k + j);
        prop_assert_eq!(history.redo_depth(), k - j);
    }

    #[test]
    fn undoing_everything_restores_initial(doc in arb_document(), ops in arb_ops(30)) {
        let initial = doc.clone();
        let mut doc = doc;
        let mut history = HistoryManager::new(HistoryConfig::unlimited());
        for op in &ops {
            let Some(cmd) = build(op, &doc) else { continue };
            prop_assert!(history.run(cmd, &mut doc).is_ok());
            check_timelines(&doc)?;
        }
        while let Some(result) = history.undo(&mut doc) {
            prop_assert!(result.is_ok());
        }
        prop_assert_eq!(doc, initial);
    }
}
