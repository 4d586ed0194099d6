#![no_main]

use arbitrary::Arbitrary;
use hotspot_core::{Document, FrameRate, Hotspot, Point, TimePoint};
use hotspot_runtime::{
    AddHotspot, AddKeyframe, HistoryConfig, HistoryManager, MoveKeyframe, MoveKeyframeCta,
    MoveKeyframePosition, RemoveHotspot, RemoveKeyframe, ToggleKeyframeEnd, UndoableCmd,
};
use libfuzzer_sys::fuzz_target;

const FPS: FrameRate = FrameRate::new(30.0);
const DURATION: f64 = 60.0;

#[derive(Debug, Arbitrary)]
enum Step {
    AddKeyframe { hotspot: u8, frame: u16, x: u8, y: u8 },
    RemoveKeyframe { hotspot: u8, index: u8 },
    MovePosition { hotspot: u8, index: u8, x: u8, y: u8 },
    MoveCta { hotspot: u8, index: u8, cta: Option<(u8, u8)> },
    Retime { hotspot: u8, index: u8, frac: u8 },
    ToggleEnd { hotspot: u8, index: u8 },
    AddHotspot,
    RemoveHotspot { hotspot: u8 },
    Undo,
    Redo,
}

fn unit(v: u8) -> f64 {
    f64::from(v) / 255.0
}

fn command(step: &Step, doc: &Document) -> Option<Box<dyn UndoableCmd>> {
    let hotspot = |h: u8| {
        let len = doc.len();
        (len > 0).then(|| &doc.hotspots()[usize::from(h) % len])
    };
    let keyframe = |h: &Hotspot, i: u8| -> Option<usize> {
        let len = h.timeline.len();
        (len > 0).then(|| usize::from(i) % len)
    };

    let cmd: Box<dyn UndoableCmd> = match *step {
        Step::AddKeyframe { hotspot: h, frame, x, y } => {
            let h = hotspot(h)?;
            let time = f64::from(frame % 1800) / 30.0;
            let nearest = h.timeline.find_nearest(time, FPS);
            if nearest.exact {
                return None;
            }
            let index = nearest.insertion_index();
            let point = TimePoint::new(time, Point::new(unit(x), unit(y)))
                .with_end(index == h.timeline.len());
            Box::new(AddKeyframe::new(h.id(), point, index))
        }
        Step::RemoveKeyframe { hotspot: h, index } => {
            let h = hotspot(h)?;
            Box::new(RemoveKeyframe::new(h.id(), keyframe(h, index)?))
        }
        Step::MovePosition { hotspot: h, index, x, y } => {
            let h = hotspot(h)?;
            let index = keyframe(h, index)?;
            let old = h.timeline.get(index)?.p;
            Box::new(MoveKeyframePosition::new(h.id(), index, old, Point::new(unit(x), unit(y))))
        }
        Step::MoveCta { hotspot: h, index, cta } => {
            let h = hotspot(h)?;
            let index = keyframe(h, index)?;
            let old = h.timeline.get(index)?.cta;
            let new = cta.map(|(x, y)| Point::new(unit(x), unit(y)));
            Box::new(MoveKeyframeCta::new(h.id(), index, old, new))
        }
        Step::Retime { hotspot: h, index, frac } => {
            let h = hotspot(h)?;
            let index = keyframe(h, index)?;
            let old_t = h.timeline.get(index)?.t;
            let (min, max) = h.timeline.retime_bounds(index, FPS, DURATION)?;
            let new_t = (min + (max - min) * unit(frac)).clamp(min, max);
            Box::new(MoveKeyframe::new(h.id(), index, old_t, new_t))
        }
        Step::ToggleEnd { hotspot: h, index } => {
            let h = hotspot(h)?;
            Box::new(ToggleKeyframeEnd::new(h.id(), keyframe(h, index)?))
        }
        Step::AddHotspot => Box::new(AddHotspot::new(Hotspot::new("example", ".example"))),
        Step::RemoveHotspot { hotspot: h } => Box::new(RemoveHotspot::new(hotspot(h)?.id())),
        Step::Undo | Step::Redo => return None,
    };
    Some(cmd)
}

fn assert_sorted(doc: &Document) {
    for hotspot in doc.iter() {
        let points = hotspot.timeline.points();
        assert!(
            points.windows(2).all(|w| w[0].t < w[1].t),
            "timeline out of order: {points:?}"
        );
    }
}

fuzz_target!(|steps: Vec<Step>| {
    let mut doc = Document::default();
    doc.push(Hotspot::new("a", ".a"));
    let initial = doc.clone();
    let mut history = HistoryManager::new(HistoryConfig::unlimited());

    for step in steps.iter().take(256) {
        match step {
            Step::Undo => {
                if let Some(result) = history.undo(&mut doc) {
                    result.expect("undo of a recorded command failed");
                }
            }
            Step::Redo => {
                if let Some(result) = history.redo(&mut doc) {
                    result.expect("redo of an undone command failed");
                }
            }
            _ => {
                if let Some(cmd) = command(step, &doc) {
                    history.run(cmd, &mut doc).expect("well-formed command rejected");
                }
            }
        }
        assert_sorted(&doc);
    }

    while let Some(result) = history.undo(&mut doc) {
        result.expect("undo failed while unwinding");
    }
    assert_eq!(doc, initial, "undoing everything did not restore the document");
});
