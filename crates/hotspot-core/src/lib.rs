#![forbid(unsafe_code)]

//! Core: hotspot documents, keyframe timelines, and frame quantization.
//!
//! # Role in the editor
//! `hotspot-core` is the data layer. It owns the document shape that is
//! stored alongside a video (hotspots, their keyframe timelines, optional
//! call-to-action anchors) and the pure queries the rest of the editor is
//! built on: where is a hotspot at time `t`, where is its CTA, and which
//! keyframe does a given time land on once snapped to video frames.
//!
//! # Primary responsibilities
//! - **Quantization**: [`FrameRate`] defines "same point in time" for the
//!   whole editor.
//! - **Timeline**: ordered [`TimePoint`]s with interpolation and
//!   nearest-keyframe search.
//! - **Document**: an arena of [`Hotspot`]s addressed by stable
//!   [`HotspotId`] handles.
//!
//! # How it fits in the system
//! `hotspot-runtime` mutates these types exclusively through reversible
//! commands. Nothing in this crate logs, performs I/O, or keeps history.

pub mod document;
pub mod geometry;
pub mod quantize;
pub mod timeline;

pub use document::{CallToAction, Document, DocumentError, Hotspot, HotspotId};
pub use geometry::Point;
pub use quantize::FrameRate;
pub use timeline::{DEFAULT_CTA, Nearest, TimePoint, Timeline, TimelineError};
