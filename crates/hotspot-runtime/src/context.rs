#![forbid(unsafe_code)]

//! The editing session.
//!
//! [`EditingContext`] bundles everything an edit needs: the document, the
//! undo history, the video clock (frame rate, playhead, duration), the
//! selection, and the editor configuration. It is passed explicitly to
//! interaction code; nothing here is global.
//!
//! # Invariants
//!
//! 1. The document is only mutated through history commands, except for
//!    live drag updates that are committed as a command on release.
//! 2. The selection is re-validated after every run, undo, and redo.

use hotspot_core::{Document, FrameRate, HotspotId, Point};

use crate::config::EditorConfig;
use crate::events::EditorEvents;
use crate::selection::Selection;
use crate::undo::{CommandResult, HistoryManager, ToggleKeyframeEnd, UndoableCmd};

/// A document under edit together with its history and playback state.
#[derive(Debug)]
pub struct EditingContext {
    pub(crate) document: Document,
    pub(crate) history: HistoryManager,
    pub(crate) frame_rate: FrameRate,
    pub(crate) playhead: f64,
    pub(crate) duration: f64,
    pub(crate) selection: Selection,
    pub(crate) config: EditorConfig,
}

impl EditingContext {
    /// Start editing `document` with the default configuration.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self::with_config(document, EditorConfig::default())
    }

    /// Start editing `document` with `config`.
    #[must_use]
    pub fn with_config(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            history: HistoryManager::new(config.history.clone()),
            frame_rate: FrameRate::UNKNOWN,
            playhead: 0.0,
            duration: 0.0,
            selection: Selection::default(),
            config,
        }
    }

    /// Set the video frame rate (builder pattern).
    #[must_use]
    pub fn with_frame_rate(mut self, fps: FrameRate) -> Self {
        self.frame_rate = fps;
        self
    }

    /// Set the video duration in seconds (builder pattern).
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The document under edit.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Finish editing and hand the document back.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Swap in a document loaded from elsewhere.
    ///
    /// History refers to the old document, so it is cleared along with the
    /// selection.
    pub fn replace_document(&mut self, document: Document) -> Document {
        self.history.clear();
        self.selection.clear();
        let old = std::mem::replace(&mut self.document, document);
        self.events().emit(crate::events::EditorEvent::DocumentChanged);
        old
    }

    /// Undo/redo history.
    #[must_use]
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Change notifications.
    #[must_use]
    pub fn events(&self) -> &EditorEvents {
        self.history.events()
    }

    /// Editor configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Video frame rate.
    #[must_use]
    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    /// Update the frame rate once video metadata is known.
    pub fn set_frame_rate(&mut self, fps: FrameRate) {
        self.frame_rate = fps;
        self.refresh_selection();
    }

    /// Current playback time in seconds.
    #[must_use]
    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    /// Report playback progress; the selected keyframe follows the playhead.
    pub fn set_playhead(&mut self, time: f64) {
        self.playhead = time;
        self.refresh_selection();
    }

    /// Video duration in seconds (0 while unknown).
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Update the video duration.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    fn refresh_selection(&mut self) {
        self.selection
            .refresh_keyframe(&self.document, self.playhead, self.frame_rate);
    }

    fn validate_selection(&mut self) {
        self.selection
            .validate(&self.document, self.playhead, self.frame_rate);
    }

    // ========================================================================
    // Rendering queries
    // ========================================================================

    /// Marker position of `hotspot` at the playhead, `None` while hidden.
    #[must_use]
    pub fn hotspot_position(&self, hotspot: HotspotId) -> Option<Point> {
        self.document.get(hotspot)?.timeline.position(self.playhead)
    }

    /// CTA marker position of `hotspot` at the playhead.
    ///
    /// `None` when the hotspot has no CTA metadata or is hidden.
    #[must_use]
    pub fn cta_position(&self, hotspot: HotspotId) -> Option<Point> {
        let hotspot = self.document.get(hotspot)?;
        hotspot.cta.as_ref()?;
        hotspot.timeline.position(self.playhead)?;
        Some(
            hotspot
                .timeline
                .cta_position_or(self.playhead, self.config.interaction.default_cta),
        )
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Apply `cmd` and record it in history.
    pub fn run(&mut self, cmd: impl UndoableCmd + 'static) -> CommandResult {
        self.run_boxed(Box::new(cmd))
    }

    /// Apply an already boxed command and record it in history.
    pub fn run_boxed(&mut self, cmd: Box<dyn UndoableCmd>) -> CommandResult {
        let result = self.history.run(cmd, &mut self.document);
        self.validate_selection();
        result
    }

    /// Revert the last command; `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<CommandResult> {
        let result = self.history.undo(&mut self.document);
        self.validate_selection();
        result
    }

    /// Re-apply the last undone command; `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<CommandResult> {
        let result = self.history.redo(&mut self.document);
        self.validate_selection();
        result
    }

    /// Flip the end flag of a keyframe, anchoring the following CTA with the
    /// configured default.
    pub fn toggle_keyframe_end(&mut self, hotspot: HotspotId, index: usize) -> CommandResult {
        let cmd = ToggleKeyframeEnd::new(hotspot, index)
            .with_default_cta(self.config.interaction.default_cta);
        self.run(cmd)
    }
}
