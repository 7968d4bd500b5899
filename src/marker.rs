// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Marker sinks.
//!
//! A marker is whatever the host renders for a diagnostic. Markers are
//! published per `(model, owner)` bucket: an owner only ever replaces its
//! own bucket, so independent providers never clear each other's output.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use crate::model::TextModel;

/// The marker type rendered by the built-in editor state.
pub type Marker = lsp_types::Diagnostic;

/// Destination for published markers.
pub trait MarkerSink<D>: Send + Sync {
    /// Atomically replaces the markers of `owner` on `model`.
    fn set_markers(&self, model: &dyn TextModel, owner: &str, markers: &[D]);
}

type Buckets<D> = HashMap<String, BTreeMap<String, Vec<D>>>;

/// In-memory marker sink keyed by model URI and owner.
pub struct MarkerStore<D> {
    buckets: Mutex<Buckets<D>>,
}

impl<D> Default for MarkerStore<D> {
    fn default() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }
}

impl<D: Clone> MarkerStore<D> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers currently published by `owner` for the model at `uri`.
    #[must_use]
    pub fn markers(&self, uri: &str, owner: &str) -> Vec<D> {
        self.lock()
            .get(uri)
            .and_then(|owners| owners.get(owner))
            .cloned()
            .unwrap_or_default()
    }

    /// All buckets for a model, ordered by owner.
    #[must_use]
    pub fn all_markers(&self, uri: &str) -> Vec<(String, Vec<D>)> {
        self.lock()
            .get(uri)
            .map(|owners| {
                owners
                    .iter()
                    .map(|(owner, markers)| (owner.clone(), markers.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drops every bucket of a model (e.g. when its file is closed).
    pub fn clear_model(&self, uri: &str) {
        self.lock().remove(uri);
    }

    /// URIs that currently have at least one marker.
    #[must_use]
    pub fn models(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.lock().keys().cloned().collect();
        uris.sort();
        uris
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Buckets<D>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D: Clone + Send> MarkerSink<D> for MarkerStore<D> {
    fn set_markers(&self, model: &dyn TextModel, owner: &str, markers: &[D]) {
        let mut buckets = self.lock();
        // Checked under the store lock so a publish racing `clear_model`
        // cannot resurrect the buckets of a closed model
        if model.is_disposed() {
            return;
        }
        if markers.is_empty() {
            if let Some(owners) = buckets.get_mut(model.uri()) {
                owners.remove(owner);
                if owners.is_empty() {
                    buckets.remove(model.uri());
                }
            }
            return;
        }
        buckets
            .entry(model.uri().to_string())
            .or_default()
            .insert(owner.to_string(), markers.to_vec());
    }
}
