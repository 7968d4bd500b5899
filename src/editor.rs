// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Editor state: open files, the current file, the primary cursor and
//! change notifications.
//!
//! Every content change dispatches the diagnostic providers of the file's
//! language. Closing a file disposes its model, so cycles still in flight
//! for it abort without publishing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use url::Url;

use crate::config::EditorOptions;
use crate::diagnostics::Dispatched;
use crate::events::{EditorEvent, EditorEventKind, Observers, SubscriptionId};
use crate::language::LanguageRegistry;
use crate::marker::{Marker, MarkerStore};
use crate::model::{MemoryModel, TextModel};

/// A 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorPosition {
    /// Line number, starting at 1.
    pub line_number: u32,
    /// Column, starting at 1.
    pub column: u32,
}

impl EditorPosition {
    /// Creates a position from 1-based coordinates.
    #[must_use]
    pub const fn new(line_number: u32, column: u32) -> Self {
        Self { line_number, column }
    }

    /// Zero-based LSP position. Coordinates below 1 are treated as 1.
    #[must_use]
    pub const fn to_lsp(self) -> lsp_types::Position {
        lsp_types::Position {
            line: self.line_number.saturating_sub(1),
            character: self.column.saturating_sub(1),
        }
    }

    /// Converts a zero-based LSP position.
    #[must_use]
    pub const fn from_lsp(position: lsp_types::Position) -> Self {
        Self::new(position.line + 1, position.character + 1)
    }
}

/// The `file://` URI of a file name.
///
/// Characters that are not valid in a URI path are percent-encoded.
///
/// # Errors
///
/// Returns an error if the base URI cannot be built.
pub fn file_uri(filename: &str) -> Result<Url> {
    let mut uri = Url::parse("file:///").context("Invalid base URI")?;
    uri.set_path(&normalize_path(filename));
    Ok(uri)
}

/// Normalizes a file name to a `/`-rooted path with `.` and `..` resolved.
///
/// Backslashes count as separators. `..` never climbs above the root.
#[must_use]
pub fn normalize_path(filename: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in filename.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

#[derive(Default)]
struct EditorInner {
    models: HashMap<String, Arc<MemoryModel>>,
    /// Open files in opening order.
    order: Vec<String>,
    current: Option<String>,
    /// Character offset of the primary cursor in the current file.
    cursor: usize,
    disposed: bool,
}

/// Open files and their diagnostics.
pub struct EditorState<D = Marker> {
    languages: Arc<LanguageRegistry<D>>,
    markers: Arc<MarkerStore<D>>,
    options: EditorOptions,
    inner: Mutex<EditorInner>,
    observers: Observers<EditorEvent>,
}

impl<D: Clone + Send + 'static> EditorState<D> {
    /// Creates an editor with no open files.
    ///
    /// `markers` should be the sink the language registry publishes into,
    /// so closing a file can clear what its providers published.
    pub fn new(
        languages: Arc<LanguageRegistry<D>>,
        markers: Arc<MarkerStore<D>>,
        options: EditorOptions,
    ) -> Self {
        Self {
            languages,
            markers,
            options,
            inner: Mutex::new(EditorInner::default()),
            observers: Observers::new(),
        }
    }

    /// Model options applied to every opened file.
    #[must_use]
    pub const fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// The installed languages.
    #[must_use]
    pub const fn languages(&self) -> &Arc<LanguageRegistry<D>> {
        &self.languages
    }

    /// Opens a file and switches to it.
    ///
    /// A new model is created only if the file is not open yet; its
    /// diagnostics are dispatched right away. Opening an already open file
    /// just switches to it and leaves its content untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor was disposed.
    pub fn open_file(&self, filename: &str, content: &str, language: &str) -> Result<Dispatched> {
        let uri = file_uri(filename)?;
        let path = normalize_path(filename);

        let mut inner = self.lock();
        if inner.disposed {
            anyhow::bail!("Editor is disposed");
        }

        let dispatched = if inner.models.contains_key(&path) {
            Dispatched::default()
        } else {
            let model = Arc::new(MemoryModel::new(uri.as_str(), content, language));
            debug!("Opened {} as {}", path, language);
            inner.models.insert(path.clone(), model.clone());
            inner.order.push(path.clone());
            let model: Arc<dyn TextModel> = model;
            self.languages.diagnostics().dispatch(&path, &model, 0)
        };

        Self::switch_locked(&mut inner, &path);
        drop(inner);
        Ok(dispatched)
    }

    /// Makes an open file current. Does nothing for unknown files.
    pub fn switch_to_file(&self, filename: &str) {
        let path = normalize_path(filename);
        Self::switch_locked(&mut self.lock(), &path);
    }

    /// Closes a file: disposes its model and clears its markers.
    ///
    /// Does nothing for unknown files.
    pub fn close_file(&self, filename: &str) {
        let path = normalize_path(filename);
        let mut inner = self.lock();
        let Some(model) = inner.models.remove(&path) else {
            return;
        };
        inner.order.retain(|open| *open != path);
        if inner.current.as_deref() == Some(path.as_str()) {
            inner.current = None;
            inner.cursor = 0;
        }
        drop(inner);

        model.dispose();
        self.markers.clear_model(model.uri());
        debug!("Closed {}", path);
    }

    /// Open files in opening order.
    #[must_use]
    pub fn files(&self) -> Vec<String> {
        self.lock().order.clone()
    }

    /// The current file, if any.
    #[must_use]
    pub fn current_file(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// Content of a file; empty for unknown files.
    #[must_use]
    pub fn file_content(&self, filename: &str) -> String {
        self.model(filename)
            .map(|model| model.value())
            .unwrap_or_default()
    }

    /// Replaces the content of an open file.
    ///
    /// Unknown files and unchanged content are ignored. Otherwise the file's
    /// diagnostics are dispatched and `ContentChanged` is emitted.
    pub fn set_file_content(&self, filename: &str, content: &str) -> Dispatched {
        let path = normalize_path(filename);
        let mut inner = self.lock();
        let Some(model) = inner.models.get(&path).cloned() else {
            return Dispatched::default();
        };
        if !model.set_value(content) {
            return Dispatched::default();
        }

        let is_current = inner.current.as_deref() == Some(path.as_str());
        let caret = if is_current {
            inner.cursor = inner.cursor.min(content.chars().count());
            inner.cursor
        } else {
            0
        };
        drop(inner);

        let model: Arc<dyn TextModel> = model;
        let dispatched = self.languages.diagnostics().dispatch(&path, &model, caret);
        self.emit(EditorEventKind::ContentChanged, path);
        dispatched
    }

    /// Character offset of the primary cursor, 0-based.
    #[must_use]
    pub fn cursor_offset(&self) -> Option<usize> {
        let inner = self.lock();
        inner.current.as_ref().map(|_| inner.cursor)
    }

    /// Moves the primary cursor to a character offset, clamped to the
    /// document. Does nothing without a current file.
    pub fn set_cursor_offset(&self, offset: usize) {
        self.move_cursor(|model| {
            let length = model.value().chars().count();
            offset.min(length)
        });
    }

    /// The primary cursor as a 1-based line and column.
    #[must_use]
    pub fn cursor_position(&self) -> Option<EditorPosition> {
        let (model, cursor) = self.current_model()?;
        Some(EditorPosition::from_lsp(model.position_at(cursor)))
    }

    /// Moves the primary cursor to a 1-based line and column, clamped to
    /// the document. Does nothing without a current file.
    pub fn set_cursor_position(&self, position: EditorPosition) {
        self.move_cursor(|model| model.offset_at(position.to_lsp()));
    }

    /// Subscribes to one kind of event. The callback receives the event,
    /// including the normalized name of the file concerned.
    pub fn subscribe<F>(&self, kind: EditorEventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&EditorEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(move |event: &EditorEvent| {
            if event.kind == kind {
                callback(event);
            }
        })
    }

    /// Removes a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Markers currently published for a file, grouped by owner.
    #[must_use]
    pub fn markers(&self, filename: &str) -> Vec<(String, Vec<D>)> {
        self.model(filename)
            .map(|model| self.markers.all_markers(model.uri()))
            .unwrap_or_default()
    }

    /// Closes every file and drops all subscriptions. The editor rejects
    /// further opens.
    pub fn dispose(&self) {
        let models: Vec<Arc<MemoryModel>> = {
            let mut inner = self.lock();
            inner.disposed = true;
            inner.current = None;
            inner.cursor = 0;
            inner.order.clear();
            std::mem::take(&mut inner.models).into_values().collect()
        };
        for model in models {
            model.dispose();
            self.markers.clear_model(model.uri());
        }
        self.observers.clear();
    }

    fn move_cursor(&self, target: impl FnOnce(&MemoryModel) -> usize) {
        let mut inner = self.lock();
        let Some(path) = inner.current.clone() else {
            return;
        };
        let Some(model) = inner.models.get(&path).cloned() else {
            return;
        };
        let offset = target(&model);
        if offset == inner.cursor {
            return;
        }
        inner.cursor = offset;
        drop(inner);

        if self.options.dispatch_on_cursor {
            let model: Arc<dyn TextModel> = model;
            // Detached: cursor moves do not wait for diagnostics
            drop(self.languages.diagnostics().dispatch(&path, &model, offset));
        }
        self.emit(EditorEventKind::CursorPositionChanged, path);
    }

    fn current_model(&self) -> Option<(Arc<MemoryModel>, usize)> {
        let inner = self.lock();
        let path = inner.current.as_ref()?;
        inner
            .models
            .get(path)
            .map(|model| (model.clone(), inner.cursor))
    }

    fn model(&self, filename: &str) -> Option<Arc<MemoryModel>> {
        self.lock().models.get(&normalize_path(filename)).cloned()
    }

    fn switch_locked(inner: &mut EditorInner, path: &str) {
        if !inner.models.contains_key(path) || inner.current.as_deref() == Some(path) {
            return;
        }
        inner.current = Some(path.to_string());
        inner.cursor = 0;
    }

    fn emit(&self, kind: EditorEventKind, filename: String) {
        self.observers.notify(&EditorEvent { kind, filename });
    }

    fn lock(&self) -> MutexGuard<'_, EditorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
