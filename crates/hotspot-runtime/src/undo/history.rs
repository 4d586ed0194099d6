#![forbid(unsafe_code)]

//! History engine for undo/redo.
//!
//! [`HistoryManager`] applies commands to a [`Document`] and keeps them on
//! two stacks:
//!
//! - **Linear history**: running a new command clears the redo stack
//! - **Depth limit**: the oldest undo entries are evicted past `max_depth`
//! - **Notifications**: every successful operation that changed the document
//!   is broadcast through [`EditorEvents`]
//!
//! # Invariants
//!
//! 1. `undo_stack.len() <= config.max_depth` after any operation.
//! 2. The redo stack is cleared whenever a new command is run.
//! 3. A command that fails stays where it was: a rejected `run` is not
//!    recorded, a failed `undo`/`redo` leaves the command on its stack.
//!
//! ```text
//! run(cmd5)
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [cmd1, cmd2, cmd3, cmd4, cmd5]    │
//! │ Redo Stack: []                                │
//! └───────────────────────────────────────────────┘
//!
//! undo() x2
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [cmd1, cmd2, cmd3]                │
//! │ Redo Stack: [cmd4, cmd5]                      │
//! └───────────────────────────────────────────────┘
//!
//! run(cmd6)  <-- clears redo
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [cmd1, cmd2, cmd3, cmd6]          │
//! │ Redo Stack: []                                │
//! └───────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::fmt;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use hotspot_core::Document;

use super::command::{CommandResult, UndoableCmd};
use crate::events::{CommandDirection, EditorEvents};

/// Configuration for the history manager.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct HistoryConfig {
    /// Maximum number of commands to keep in undo history.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

impl HistoryConfig {
    /// Create a configuration with a custom depth limit.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Largest depth limit; still fits a TOML (signed 64-bit) integer.
    pub const UNLIMITED_DEPTH: usize = i64::MAX as usize;

    /// Create unlimited configuration (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: Self::UNLIMITED_DEPTH,
        }
    }
}

/// Manager for undo/redo history.
pub struct HistoryManager {
    /// Commands available for undo (newest at back).
    undo_stack: VecDeque<Box<dyn UndoableCmd>>,
    /// Commands available for redo (newest at back).
    redo_stack: VecDeque<Box<dyn UndoableCmd>>,
    config: HistoryConfig,
    events: EditorEvents,
}

impl fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryManager {
    /// Create a history manager with its own event channel.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self::with_events(config, EditorEvents::new())
    }

    /// Create a history manager that notifies through `events`.
    #[must_use]
    pub fn with_events(config: HistoryConfig, events: EditorEvents) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            config,
            events,
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Apply a new command and record it.
    ///
    /// Clears the redo stack and enforces the depth limit. On error the
    /// document is untouched and the command is dropped.
    pub fn run(&mut self, mut cmd: Box<dyn UndoableCmd>, document: &mut Document) -> CommandResult {
        let kind = cmd.kind();
        let span = tracing::debug_span!(
            "editor.command",
            kind = %kind,
            direction = CommandDirection::Run.as_str(),
            changed = tracing::field::Empty,
        )
        .entered();

        let changed = match cmd.apply(document) {
            Ok(changed) => changed,
            Err(err) => {
                tracing::warn!(
                    target: "hotspot.history",
                    kind = %kind,
                    error = %err,
                    "command rejected"
                );
                return Err(err);
            }
        };
        span.record("changed", changed);

        self.redo_stack.clear();
        self.undo_stack.push_back(cmd);
        self.enforce_limits();

        tracing::debug!(
            target: "hotspot.history",
            kind = %kind,
            undo_depth = self.undo_stack.len(),
            "command run"
        );

        if changed {
            self.events.emit_command(kind, CommandDirection::Run);
        }
        Ok(changed)
    }

    /// Revert the last command.
    ///
    /// # Returns
    ///
    /// - `Some(Ok(changed))` if undo succeeded
    /// - `Some(Err(error))` if undo failed (command remains on undo stack)
    /// - `None` if there is nothing to undo
    pub fn undo(&mut self, document: &mut Document) -> Option<CommandResult> {
        let mut cmd = self.undo_stack.pop_back()?;
        let result = Self::step(cmd.as_mut(), document, CommandDirection::Undo);
        match result {
            Ok(changed) => {
                if changed {
                    self.events.emit_command(cmd.kind(), CommandDirection::Undo);
                }
                self.redo_stack.push_back(cmd);
            }
            Err(_) => self.undo_stack.push_back(cmd),
        }
        Some(result)
    }

    /// Re-apply the last undone command.
    ///
    /// # Returns
    ///
    /// - `Some(Ok(changed))` if redo succeeded
    /// - `Some(Err(error))` if redo failed (command remains on redo stack)
    /// - `None` if there is nothing to redo
    pub fn redo(&mut self, document: &mut Document) -> Option<CommandResult> {
        let mut cmd = self.redo_stack.pop_back()?;
        let result = Self::step(cmd.as_mut(), document, CommandDirection::Redo);
        match result {
            Ok(changed) => {
                if changed {
                    self.events.emit_command(cmd.kind(), CommandDirection::Redo);
                }
                self.undo_stack.push_back(cmd);
            }
            Err(_) => self.redo_stack.push_back(cmd),
        }
        Some(result)
    }

    fn step(cmd: &mut dyn UndoableCmd, document: &mut Document, direction: CommandDirection) -> CommandResult {
        let kind = cmd.kind();
        let span = tracing::debug_span!(
            "editor.command",
            kind = %kind,
            direction = direction.as_str(),
            changed = tracing::field::Empty,
        )
        .entered();

        let result = match direction {
            CommandDirection::Undo => cmd.revert(document),
            CommandDirection::Run | CommandDirection::Redo => cmd.redo(document),
        };

        match &result {
            Ok(changed) => {
                span.record("changed", *changed);
                tracing::debug!(
                    target: "hotspot.history",
                    kind = %kind,
                    direction = direction.as_str(),
                    "{}",
                    cmd.description()
                );
            }
            Err(err) => tracing::warn!(
                target: "hotspot.history",
                kind = %kind,
                direction = direction.as_str(),
                error = %err,
                "history step failed"
            ),
        }
        result
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Get the undo stack depth.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the redo stack depth.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Get descriptions for undo commands (most recent first).
    pub fn undo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.undo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|c| c.description())
            .collect()
    }

    /// Get the description of the next undo command.
    #[must_use]
    pub fn next_undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|c| c.description())
    }

    /// Get the description of the next redo command.
    #[must_use]
    pub fn next_redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|c| c.description())
    }

    /// Most recent command on the undo stack.
    #[must_use]
    pub fn last_command(&self) -> Option<&dyn UndoableCmd> {
        self.undo_stack.back().map(|c| c.as_ref())
    }

    /// Get the current configuration.
    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Event channel used for notifications.
    #[must_use]
    pub fn events(&self) -> &EditorEvents {
        &self.events
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Clear all history (both undo and redo).
    pub fn clear(&mut self) {
        tracing::info!(
            target: "hotspot.history",
            undo_depth = self.undo_stack.len(),
            redo_depth = self.redo_stack.len(),
            "history cleared"
        );
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Evict the oldest undo entries past the depth limit.
    fn enforce_limits(&mut self) {
        while self.undo_stack.len() > self.config.max_depth {
            self.undo_stack.pop_front();
        }
    }
}
