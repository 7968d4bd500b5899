// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Text model abstraction.
//!
//! The diagnostic engine never edits a model. It reads the full text once per
//! request, checks disposal after every suspension point, and uses the URI
//! to scope published markers.

use lsp_types::Position;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::text;

/// A document as seen by diagnostics and marker sinks.
pub trait TextModel: Send + Sync {
    /// Stable identity of the model (a `file://` URI).
    fn uri(&self) -> &str;

    /// The current full text.
    fn value(&self) -> String;

    /// Whether the model has been closed. Disposed models must not receive
    /// markers.
    fn is_disposed(&self) -> bool;

    /// The resolved language identifier.
    fn language_id(&self) -> &str;
}

struct ModelContent {
    text: String,
    version: i32,
}

/// In-memory [`TextModel`] owned by the editor state.
pub struct MemoryModel {
    uri: String,
    language_id: String,
    content: Mutex<ModelContent>,
    disposed: AtomicBool,
}

impl MemoryModel {
    /// Creates a model at version 1.
    #[must_use]
    pub fn new(
        uri: impl Into<String>,
        text: impl Into<String>,
        language_id: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            language_id: language_id.into(),
            content: Mutex::new(ModelContent {
                text: text.into(),
                version: 1,
            }),
            disposed: AtomicBool::new(false),
        }
    }

    /// Replaces the text, bumping the version.
    ///
    /// Returns `false` without touching the model when it is disposed or
    /// the text is unchanged.
    pub fn set_value(&self, text: &str) -> bool {
        if self.is_disposed() {
            return false;
        }
        let mut content = self.content.lock().unwrap_or_else(PoisonError::into_inner);
        if content.text == text {
            return false;
        }
        content.text = text.to_string();
        content.version += 1;
        true
    }

    /// Monotonic edit counter, starting at 1.
    #[must_use]
    pub fn version(&self) -> i32 {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    /// Marks the model as disposed. Idempotent.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    /// Character offset of a zero-based position.
    #[must_use]
    pub fn offset_at(&self, position: Position) -> usize {
        text::position_to_offset(&self.value(), position)
    }

    /// Zero-based position of a character offset.
    #[must_use]
    pub fn position_at(&self, offset: usize) -> Position {
        text::offset_to_position(&self.value(), offset)
    }
}

impl TextModel for MemoryModel {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn value(&self) -> String {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .text
            .clone()
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn language_id(&self) -> &str {
        &self.language_id
    }
}

impl std::fmt::Debug for MemoryModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryModel")
            .field("uri", &self.uri)
            .field("language_id", &self.language_id)
            .field("version", &self.version())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
