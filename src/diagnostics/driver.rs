// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Per-provider request/merge/publish cycle.
//!
//! Each call to [`DiagnosticDriver::update`] takes a fresh [`Generation`]
//! and snapshots the model text before anything is awaited. The cycle then
//! awaits the provider's tasks one by one; after every suspension point it
//! re-checks that its generation is still current and that the model is
//! still open, and abandons the cycle otherwise. Merging and publishing
//! happen under the driver's lock together with that check, so once a newer
//! `update` has been issued nothing from an older cycle reaches the sink.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

use super::error::DiagnosticError;
use super::generation::Generation;
use super::provider::DiagnosticProvider;
use crate::marker::MarkerSink;
use crate::model::TextModel;

/// How a request cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every task was processed and the finalization merge ran.
    Completed {
        /// Number of marker publishes, including the finalization pass.
        publishes: usize,
    },
    /// The provider returned no tasks; nothing was published.
    Empty,
    /// A newer request took over; remaining results were discarded.
    Superseded,
    /// The model was closed; remaining results were discarded.
    Disposed,
}

struct DriverState<T, D> {
    generation: Generation,
    data: Vec<T>,
    markers: Vec<D>,
}

/// Drives one registered [`DiagnosticProvider`].
pub struct DiagnosticDriver<P: DiagnosticProvider> {
    provider: Arc<P>,
    sink: Arc<dyn MarkerSink<P::Marker>>,
    state: Mutex<DriverState<P::Data, P::Marker>>,
}

impl<P: DiagnosticProvider> DiagnosticDriver<P> {
    /// Creates an idle driver publishing into `sink`.
    pub fn new(provider: Arc<P>, sink: Arc<dyn MarkerSink<P::Marker>>) -> Self {
        Self {
            provider,
            sink,
            state: Mutex::new(DriverState {
                generation: Generation::NONE,
                data: Vec::new(),
                markers: Vec::new(),
            }),
        }
    }

    /// Owner tag of the wrapped provider.
    pub fn owner_id(&self) -> &str {
        self.provider.owner_id()
    }

    /// The generation of the most recent request.
    pub fn generation(&self) -> Generation {
        self.lock().generation
    }

    /// Markers from the last publish.
    pub fn published_markers(&self) -> Vec<P::Marker>
    where
        P::Marker: Clone,
    {
        self.lock().markers.clone()
    }

    /// Data accepted by the last merge.
    pub fn published_data(&self) -> Vec<P::Data>
    where
        P::Data: Clone,
    {
        self.lock().data.clone()
    }

    /// Starts a new request cycle, superseding any cycle in flight.
    ///
    /// The generation and the text snapshot are taken before this function
    /// returns, so the order of `update` calls decides which cycle is
    /// current regardless of when the returned futures are polled.
    ///
    /// # Errors
    ///
    /// The returned future fails with [`DiagnosticError`] when the provider
    /// cannot start the request or a task fails. Published markers are left
    /// as they were in both cases.
    pub fn update(
        self: &Arc<Self>,
        filename: &str,
        model: Arc<dyn TextModel>,
        caret_offset: usize,
    ) -> impl Future<Output = Result<CycleOutcome, DiagnosticError>> + Send + 'static {
        let generation = self.begin();
        let text = model.value();
        let filename = filename.to_string();
        let driver = Arc::clone(self);
        async move {
            driver
                .run(generation, filename, model, text, caret_offset)
                .await
        }
    }

    fn begin(&self) -> Generation {
        let generation = Generation::next();
        self.lock().generation = generation;
        generation
    }

    async fn run(
        &self,
        generation: Generation,
        filename: String,
        model: Arc<dyn TextModel>,
        text: String,
        caret_offset: usize,
    ) -> Result<CycleOutcome, DiagnosticError> {
        let owner = self.owner_id();
        debug!("Diagnostic request {} for {} ({})", generation, filename, owner);

        let request = self
            .provider
            .new_request(&filename, model.as_ref(), &text, caret_offset)
            .await;

        // A stale or closed request is dropped quietly, even if it failed
        if let Some(outcome) = self.interrupted(generation, model.as_ref()) {
            debug!(
                "Request {} for {} dropped before streaming: {:?}",
                generation, owner, outcome
            );
            return Ok(outcome);
        }
        let tasks = request.map_err(|source| DiagnosticError::Request {
            owner: owner.to_string(),
            source,
        })?;
        if tasks.is_empty() {
            trace!("Request {} for {} returned no tasks", generation, owner);
            return Ok(CycleOutcome::Empty);
        }

        let count = tasks.len();
        let mut previous: Vec<P::Data> = Vec::new();
        let mut publishes = 0usize;

        for (index, task) in tasks.into_iter().enumerate() {
            let result = task.await;

            // A stale or closed cycle is abandoned quietly, even if the task failed
            if let Some(outcome) = self.interrupted(generation, model.as_ref()) {
                debug!(
                    "Request {} for {} abandoned at task {}/{}: {:?}",
                    generation,
                    owner,
                    index + 1,
                    count,
                    outcome
                );
                return Ok(outcome);
            }

            let batch = match result {
                Ok(Some(batch)) => batch,
                Ok(None) => {
                    trace!("Task {}/{} of {} yielded no result", index + 1, count, generation);
                    continue;
                }
                Err(source) => {
                    return Err(DiagnosticError::Task {
                        owner: owner.to_string(),
                        index,
                        source,
                    });
                }
            };

            if let Some(outcome) =
                self.merge_and_publish(generation, model.as_ref(), &batch, &previous)
            {
                return Ok(outcome);
            }
            publishes += 1;
            trace!("Task {}/{} of {} merged {} items", index + 1, count, generation, batch.len());
            previous = batch;
        }

        // Let the policy drop whatever no task refreshed
        if let Some(outcome) =
            self.merge_and_publish(generation, model.as_ref(), &previous, &previous)
        {
            return Ok(outcome);
        }
        publishes += 1;

        debug!("Request {} for {} completed with {} publishes", generation, owner, publishes);
        Ok(CycleOutcome::Completed { publishes })
    }

    /// Merges `batch` and publishes the result, unless the cycle was
    /// interrupted. Returns the interruption, if any.
    fn merge_and_publish(
        &self,
        generation: Generation,
        model: &dyn TextModel,
        batch: &[P::Data],
        previous: &[P::Data],
    ) -> Option<CycleOutcome> {
        let mut state = self.lock();
        if let Some(outcome) = interruption(&state, generation, model) {
            return Some(outcome);
        }

        let merged = self
            .provider
            .merge_data(model, &state.data, batch, previous, &state.markers);
        state.data = merged.data;
        state.markers = merged.markers;
        self.sink
            .set_markers(model, self.provider.owner_id(), &state.markers);
        drop(state);
        None
    }

    fn interrupted(&self, generation: Generation, model: &dyn TextModel) -> Option<CycleOutcome> {
        interruption(&self.lock(), generation, model)
    }

    fn lock(&self) -> MutexGuard<'_, DriverState<P::Data, P::Marker>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn interruption<T, D>(
    state: &DriverState<T, D>,
    generation: Generation,
    model: &dyn TextModel,
) -> Option<CycleOutcome> {
    if state.generation != generation {
        Some(CycleOutcome::Superseded)
    } else if model.is_disposed() {
        Some(CycleOutcome::Disposed)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::merge::{MergePolicy, ReplaceAll};
    use crate::diagnostics::provider::Merged;
    use crate::diagnostics::task::DiagnosticTask;
    use crate::marker::MarkerStore;
    use crate::model::MemoryModel;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider returning a fixed list of ready batches; `None` entries are
    /// "no result" tasks.
    struct Scripted {
        batches: Vec<Option<Vec<&'static str>>>,
        merges: AtomicUsize,
    }

    impl Scripted {
        fn new(batches: Vec<Option<Vec<&'static str>>>) -> Arc<Self> {
            Arc::new(Self {
                batches,
                merges: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DiagnosticProvider for Scripted {
        type Data = &'static str;
        type Marker = &'static str;

        fn owner_id(&self) -> &str {
            "scripted"
        }

        async fn new_request(
            &self,
            _filename: &str,
            _model: &dyn TextModel,
            _text: &str,
            _caret_offset: usize,
        ) -> anyhow::Result<Vec<DiagnosticTask<&'static str>>> {
            Ok(self
                .batches
                .iter()
                .map(|batch| {
                    batch
                        .clone()
                        .map_or_else(DiagnosticTask::no_result, DiagnosticTask::ready)
                })
                .collect())
        }

        fn merge_data(
            &self,
            _model: &dyn TextModel,
            current: &[&'static str],
            new_batch: &[&'static str],
            previous_batch: &[&'static str],
            current_markers: &[&'static str],
        ) -> Merged<&'static str, &'static str> {
            self.merges.fetch_add(1, Ordering::SeqCst);
            ReplaceAll.merge(current, new_batch, previous_batch, current_markers)
        }
    }

    fn setup(
        provider: &Arc<Scripted>,
    ) -> (Arc<DiagnosticDriver<Scripted>>, Arc<MarkerStore<&'static str>>, Arc<MemoryModel>) {
        let store = Arc::new(MarkerStore::new());
        let driver = Arc::new(DiagnosticDriver::new(Arc::clone(provider), store.clone()));
        let model = Arc::new(MemoryModel::new("file:///demo.txt", "text", "demo"));
        (driver, store, model)
    }

    #[tokio::test]
    async fn test_completed_cycle_publishes_per_task_and_finalizes() -> Result<()> {
        let provider = Scripted::new(vec![Some(vec!["a"]), Some(vec!["b"])]);
        let (driver, store, model) = setup(&provider);

        let outcome = driver.update("demo.txt", model, 0).await?;

        assert_eq!(outcome, CycleOutcome::Completed { publishes: 3 });
        assert_eq!(provider.merges.load(Ordering::SeqCst), 3);
        assert_eq!(store.markers("file:///demo.txt", "scripted"), vec!["b"]);
        assert_eq!(driver.published_data(), vec!["b"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_task_list_publishes_nothing() -> Result<()> {
        let provider = Scripted::new(vec![]);
        let (driver, store, model) = setup(&provider);

        let outcome = driver.update("demo.txt", model, 0).await?;

        assert_eq!(outcome, CycleOutcome::Empty);
        assert_eq!(provider.merges.load(Ordering::SeqCst), 0);
        assert!(store.models().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_all_no_result_still_finalizes() -> Result<()> {
        let provider = Scripted::new(vec![None, None]);
        let (driver, _store, model) = setup(&provider);

        let outcome = driver.update("demo.txt", model, 0).await?;

        assert_eq!(outcome, CycleOutcome::Completed { publishes: 1 });
        assert_eq!(provider.merges.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_disposed_before_streaming() -> Result<()> {
        let provider = Scripted::new(vec![Some(vec!["a"])]);
        let (driver, store, model) = setup(&provider);

        let cycle = driver.update("demo.txt", model.clone(), 0);
        model.dispose();

        assert_eq!(cycle.await?, CycleOutcome::Disposed);
        assert_eq!(provider.merges.load(Ordering::SeqCst), 0);
        assert!(store.models().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_superseded_before_streaming() -> Result<()> {
        let provider = Scripted::new(vec![Some(vec!["a"])]);
        let (driver, _store, model) = setup(&provider);

        let first = driver.update("demo.txt", model.clone(), 0);
        let second = driver.update("demo.txt", model, 0);

        assert_eq!(first.await?, CycleOutcome::Superseded);
        assert_eq!(second.await?, CycleOutcome::Completed { publishes: 2 });
        Ok(())
    }

    #[tokio::test]
    async fn test_generation_advances_on_update() {
        let provider = Scripted::new(vec![]);
        let (driver, _store, model) = setup(&provider);
        assert!(driver.generation().is_none());

        let _cycle = driver.update("demo.txt", model.clone(), 0);
        let first = driver.generation();
        let _cycle = driver.update("demo.txt", model, 0);
        assert!(driver.generation() > first);
    }

    struct Failing;

    #[async_trait]
    impl DiagnosticProvider for Failing {
        type Data = u8;
        type Marker = u8;

        fn owner_id(&self) -> &str {
            "failing"
        }

        async fn new_request(
            &self,
            _filename: &str,
            _model: &dyn TextModel,
            _text: &str,
            _caret_offset: usize,
        ) -> anyhow::Result<Vec<DiagnosticTask<u8>>> {
            Err(anyhow!("compiler unavailable"))
        }

        fn merge_data(
            &self,
            _model: &dyn TextModel,
            _current: &[u8],
            new_batch: &[u8],
            _previous_batch: &[u8],
            _current_markers: &[u8],
        ) -> Merged<u8, u8> {
            Merged::new(new_batch.to_vec(), new_batch.to_vec())
        }
    }

    #[tokio::test]
    async fn test_request_failure_is_reported() {
        let store: Arc<MarkerStore<u8>> = Arc::new(MarkerStore::new());
        let driver = Arc::new(DiagnosticDriver::new(Arc::new(Failing), store));
        let model = Arc::new(MemoryModel::new("file:///demo.txt", "", "demo"));

        let result = driver.update("demo.txt", model, 0).await;
        assert!(
            matches!(&result, Err(DiagnosticError::Request { owner, .. }) if owner == "failing"),
            "expected request error, got {result:?}"
        );
    }
}
