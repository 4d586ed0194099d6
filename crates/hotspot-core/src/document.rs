#![forbid(unsafe_code)]

//! Hotspot document: the video reference plus its annotated hotspots.
//!
//! # Arena and handles
//!
//! Hotspots live in an ordered list (display order), but nothing addresses
//! them by position. Each hotspot carries a [`HotspotId`] assigned by the
//! document when it is first added; the id survives removal and re-insertion
//! so undo history can keep referring to it.
//!
//! # Stored format
//!
//! ```json
//! { "video": { ... }, "hotspots": [ { "target": "...", "selector": "...",
//!   "timeline": { "points": [ { "t": 1.0, "p": { "x": 0.5, "y": 0.5 } } ] },
//!   "cta": { "caption": "Buy", "value": "https://..." } } ] }
//! ```
//!
//! Ids are not part of the stored format; they are handed out in list order
//! on load.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timeline::Timeline;

/// Stable handle to a hotspot within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HotspotId(u64);

impl HotspotId {
    /// Id of a hotspot that has not been added to a document yet.
    pub const UNASSIGNED: HotspotId = HotspotId(0);

    /// Raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whether a document has assigned this id.
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for HotspotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hotspot#{}", self.0)
    }
}

/// Hotspot-level call-to-action metadata (distinct from per-keyframe CTA
/// positions).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallToAction {
    /// Button caption shown centered on the CTA position.
    #[serde(default)]
    pub caption: String,
    /// Action value, typically a URL.
    #[serde(default)]
    pub value: String,
}

impl CallToAction {
    /// Create CTA metadata.
    #[must_use]
    pub fn new(caption: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            value: value.into(),
        }
    }
}

/// An annotated element whose marker is animated over video time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    #[serde(skip)]
    id: HotspotId,
    /// Target identifier (opaque to the editor core).
    pub target: String,
    /// Selector of the annotated element (opaque to the editor core).
    pub selector: String,
    /// Marker keyframes.
    #[serde(default)]
    pub timeline: Timeline,
    /// Call-to-action metadata; `None` disables the CTA marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<CallToAction>,
    /// Integration data carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Hotspot {
    /// Create a hotspot with an empty timeline.
    #[must_use]
    pub fn new(target: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            id: HotspotId::UNASSIGNED,
            target: target.into(),
            selector: selector.into(),
            timeline: Timeline::new(),
            cta: None,
            data: None,
        }
    }

    /// Set the CTA metadata (builder pattern).
    #[must_use]
    pub fn with_cta(mut self, cta: CallToAction) -> Self {
        self.cta = Some(cta);
        self
    }

    /// Set the timeline (builder pattern).
    #[must_use]
    pub fn with_timeline(mut self, timeline: Timeline) -> Self {
        self.timeline = timeline;
        self
    }

    /// Handle assigned by the owning document.
    #[must_use]
    pub fn id(&self) -> HotspotId {
        self.id
    }
}

/// Errors from document structure operations and (de)serialization.
#[derive(Debug)]
pub enum DocumentError {
    /// Malformed or mistyped JSON.
    Json(serde_json::Error),
    /// Insert position past the end of the hotspot list.
    IndexOutOfBounds { index: usize, len: usize },
    /// A hotspot with this id is already in the document.
    DuplicateId(HotspotId),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "document JSON error: {err}"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "hotspot index {index} out of bounds (length {len})")
            }
            Self::DuplicateId(id) => write!(f, "{id} is already in the document"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Stored shape of a [`Document`].
#[derive(Serialize, Deserialize)]
struct DocumentRepr {
    #[serde(default)]
    video: Value,
    #[serde(default)]
    hotspots: Vec<Hotspot>,
}

/// The video reference and its hotspots.
///
/// Equality compares content only (video and hotspots, ids included), not
/// the id allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "DocumentRepr", into = "DocumentRepr")]
pub struct Document {
    /// Opaque video reference owned by the host application.
    pub video: Value,
    hotspots: Vec<Hotspot>,
    next_id: u64,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.video == other.video && self.hotspots == other.hotspots
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl From<DocumentRepr> for Document {
    fn from(repr: DocumentRepr) -> Self {
        let mut document = Document::new(repr.video);
        for hotspot in repr.hotspots {
            document.push(hotspot);
        }
        document
    }
}

impl From<Document> for DocumentRepr {
    fn from(document: Document) -> Self {
        Self {
            video: document.video,
            hotspots: document.hotspots,
        }
    }
}

impl Document {
    /// Create an empty document for `video`.
    #[must_use]
    pub fn new(video: Value) -> Self {
        Self {
            video,
            hotspots: Vec::new(),
            next_id: 1,
        }
    }

    /// Parse a stored document.
    pub fn from_json_str(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the stored form.
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Hotspots in display order.
    #[must_use]
    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    /// Iterate hotspots in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Hotspot> {
        self.hotspots.iter()
    }

    /// Number of hotspots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    /// Whether the document has no hotspots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }

    /// Display position of `id`.
    #[must_use]
    pub fn index_of(&self, id: HotspotId) -> Option<usize> {
        self.hotspots.iter().position(|hotspot| hotspot.id == id)
    }

    /// Whether `id` is in the document.
    #[must_use]
    pub fn contains(&self, id: HotspotId) -> bool {
        self.index_of(id).is_some()
    }

    /// Hotspot by handle.
    #[must_use]
    pub fn get(&self, id: HotspotId) -> Option<&Hotspot> {
        self.hotspots.iter().find(|hotspot| hotspot.id == id)
    }

    /// Mutable hotspot by handle.
    pub fn get_mut(&mut self, id: HotspotId) -> Option<&mut Hotspot> {
        self.hotspots.iter_mut().find(|hotspot| hotspot.id == id)
    }

    // ========================================================================
    // Structure
    // ========================================================================

    fn allocate_id(&mut self) -> HotspotId {
        let id = HotspotId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a hotspot, assigning it a fresh id.
    pub fn push(&mut self, mut hotspot: Hotspot) -> HotspotId {
        let id = self.allocate_id();
        hotspot.id = id;
        self.hotspots.push(hotspot);
        id
    }

    /// Insert a hotspot at `index`.
    ///
    /// A hotspot that already carries an id (one previously removed from
    /// this document) keeps it; otherwise a fresh id is assigned.
    pub fn insert_at(&mut self, index: usize, mut hotspot: Hotspot) -> Result<HotspotId, DocumentError> {
        if index > self.hotspots.len() {
            return Err(DocumentError::IndexOutOfBounds {
                index,
                len: self.hotspots.len(),
            });
        }

        if hotspot.id.is_assigned() {
            if self.contains(hotspot.id) {
                return Err(DocumentError::DuplicateId(hotspot.id));
            }
            self.next_id = self.next_id.max(hotspot.id.0 + 1);
        } else {
            hotspot.id = self.allocate_id();
        }

        let id = hotspot.id;
        self.hotspots.insert(index, hotspot);
        Ok(id)
    }

    /// Remove a hotspot, returning its former position and value.
    pub fn remove(&mut self, id: HotspotId) -> Option<(usize, Hotspot)> {
        let index = self.index_of(id)?;
        Some((index, self.hotspots.remove(index)))
    }
}
