// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

use async_trait::async_trait;

use super::task::DiagnosticTask;
use crate::model::TextModel;

/// Next published state, as decided by a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged<T, D> {
    /// Accepted data, fed back as `current` into the next merge.
    pub data: Vec<T>,
    /// Markers to publish for the provider's owner tag.
    pub markers: Vec<D>,
}

impl<T, D> Merged<T, D> {
    /// Creates a merge result.
    #[must_use]
    pub const fn new(data: Vec<T>, markers: Vec<D>) -> Self {
        Self { data, markers }
    }
}

impl<T, D> Default for Merged<T, D> {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

/// A language service that produces diagnostics for one owner tag.
///
/// Providers are immutable once registered; all mutable state lives in the
/// [`DiagnosticDriver`](super::DiagnosticDriver) wrapping them.
#[async_trait]
pub trait DiagnosticProvider: Send + Sync + 'static {
    /// Opaque data accumulated across merges.
    type Data: Send + 'static;
    /// Marker type understood by the sink.
    type Marker: Send + 'static;

    /// Tag scoping this provider's markers on a model.
    fn owner_id(&self) -> &str;

    /// Starts a request for `text`, the model's content when the request
    /// was issued.
    ///
    /// The returned tasks are awaited strictly in order. An empty list
    /// publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be started. The driver keeps
    /// the previously published markers.
    async fn new_request(
        &self,
        filename: &str,
        model: &dyn TextModel,
        text: &str,
        caret_offset: usize,
    ) -> anyhow::Result<Vec<DiagnosticTask<Self::Data>>>;

    /// Reconciles the accepted data with a newly arrived batch.
    ///
    /// `previous_batch` is the batch merged just before this one in the
    /// same request (empty for the first). After the last task the driver
    /// calls this once more with the final batch as both `new_batch` and
    /// `previous_batch` so the policy can finalize.
    fn merge_data(
        &self,
        model: &dyn TextModel,
        current: &[Self::Data],
        new_batch: &[Self::Data],
        previous_batch: &[Self::Data],
        current_markers: &[Self::Marker],
    ) -> Merged<Self::Data, Self::Marker>;
}
