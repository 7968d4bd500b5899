// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Language → driver registry and fire-and-forget dispatch.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use super::driver::{CycleOutcome, DiagnosticDriver};
use super::error::DiagnosticError;
use super::provider::DiagnosticProvider;
use crate::marker::MarkerSink;
use crate::model::TextModel;

/// A driver with its data and marker types erased.
trait DynDriver: Send + Sync {
    fn owner_id(&self) -> &str;

    fn start(
        self: Arc<Self>,
        filename: &str,
        model: Arc<dyn TextModel>,
        caret_offset: usize,
    ) -> BoxFuture<'static, Result<CycleOutcome, DiagnosticError>>;
}

impl<P: DiagnosticProvider> DynDriver for DiagnosticDriver<P> {
    fn owner_id(&self) -> &str {
        DiagnosticDriver::owner_id(self)
    }

    fn start(
        self: Arc<Self>,
        filename: &str,
        model: Arc<dyn TextModel>,
        caret_offset: usize,
    ) -> BoxFuture<'static, Result<CycleOutcome, DiagnosticError>> {
        self.update(filename, model, caret_offset).boxed()
    }
}

/// Maps language identifiers to the drivers of their diagnostic providers.
///
/// Registration is append-only. Each registration creates an independent
/// driver, even when the same provider is registered twice.
pub struct DiagnosticRegistry<D> {
    sink: Arc<dyn MarkerSink<D>>,
    drivers: RwLock<HashMap<String, Vec<Arc<dyn DynDriver>>>>,
}

impl<D: Send + 'static> DiagnosticRegistry<D> {
    /// Creates an empty registry publishing into `sink`.
    pub fn new(sink: Arc<dyn MarkerSink<D>>) -> Self {
        Self {
            sink,
            drivers: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a driver for `provider` under `language_id`.
    ///
    /// Registration must happen before a dispatch for that language for the
    /// provider to take part in it.
    pub fn register<P>(&self, language_id: &str, provider: Arc<P>) -> Arc<DiagnosticDriver<P>>
    where
        P: DiagnosticProvider<Marker = D>,
    {
        let driver = Arc::new(DiagnosticDriver::new(provider, Arc::clone(&self.sink)));
        debug!(
            "Registered diagnostic provider {} for {}",
            driver.owner_id(),
            language_id
        );
        self.drivers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(language_id.to_string())
            .or_default()
            .push(driver.clone());
        driver
    }

    /// Starts an update on every driver registered for the model's language.
    ///
    /// Returns immediately; each driver runs on its own Tokio task. A
    /// failing driver is logged and never affects its siblings. Outside a
    /// Tokio runtime nothing is started.
    pub fn dispatch(
        &self,
        filename: &str,
        model: &Arc<dyn TextModel>,
        caret_offset: usize,
    ) -> Dispatched {
        let language = model.language_id().to_string();
        let drivers = self.drivers_for(&language);
        if drivers.is_empty() {
            trace!("No diagnostic providers for {}", language);
            return Dispatched::default();
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("Diagnostics for {} skipped: no Tokio runtime", filename);
            return Dispatched::default();
        };

        let handles = drivers
            .into_iter()
            .map(|driver| {
                let owner = driver.owner_id().to_string();
                let language = language.clone();
                let cycle = driver.start(filename, Arc::clone(model), caret_offset);
                runtime.spawn(async move {
                    match cycle.await {
                        Ok(outcome) => {
                            trace!("Diagnostics {} for {}: {:?}", owner, language, outcome);
                        }
                        Err(e) => {
                            warn!("Diagnostic provider {} for {} failed: {}", owner, language, e);
                        }
                    }
                })
            })
            .collect();

        Dispatched { handles }
    }

    /// Owner tags registered for a language, in registration order.
    #[must_use]
    pub fn owners(&self, language_id: &str) -> Vec<String> {
        self.drivers_for(language_id)
            .iter()
            .map(|driver| driver.owner_id().to_string())
            .collect()
    }

    /// Languages with at least one registered provider, sorted.
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self
            .drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        languages.sort();
        languages
    }

    fn drivers_for(&self, language_id: &str) -> Vec<Arc<dyn DynDriver>> {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(language_id)
            .cloned()
            .unwrap_or_default()
    }
}

/// Handles of the driver tasks started by one dispatch.
///
/// Dropping it detaches the tasks; they keep running to completion.
#[derive(Debug, Default)]
#[must_use = "drop the handle to detach, or await `settled` to wait for the providers"]
pub struct Dispatched {
    handles: Vec<JoinHandle<()>>,
}

impl Dispatched {
    /// Number of drivers started.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no driver was registered for the language.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits until every started driver has finished its cycle.
    pub async fn settled(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Diagnostic driver task aborted: {}", e);
            }
        }
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
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct Fixed {
        owner: &'static str,
        markers: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl DiagnosticProvider for Fixed {
        type Data = &'static str;
        type Marker = &'static str;

        fn owner_id(&self) -> &str {
            self.owner
        }

        async fn new_request(
            &self,
            _filename: &str,
            _model: &dyn TextModel,
            _text: &str,
            _caret_offset: usize,
        ) -> anyhow::Result<Vec<DiagnosticTask<&'static str>>> {
            if self.fail {
                return Err(anyhow!("provider crashed"));
            }
            Ok(vec![DiagnosticTask::ready(self.markers.clone())])
        }

        fn merge_data(
            &self,
            _model: &dyn TextModel,
            current: &[&'static str],
            new_batch: &[&'static str],
            previous_batch: &[&'static str],
            current_markers: &[&'static str],
        ) -> Merged<&'static str, &'static str> {
            ReplaceAll.merge(current, new_batch, previous_batch, current_markers)
        }
    }

    fn fixed(owner: &'static str, markers: Vec<&'static str>, fail: bool) -> Arc<Fixed> {
        Arc::new(Fixed { owner, markers, fail })
    }

    #[tokio::test]
    async fn test_dispatch_fans_out_to_language_drivers() {
        let store: Arc<MarkerStore<&'static str>> = Arc::new(MarkerStore::new());
        let registry = DiagnosticRegistry::new(store.clone());
        registry.register("demo", fixed("a", vec!["a1"], false));
        registry.register("demo", fixed("b", vec!["b1"], false));
        registry.register("other", fixed("c", vec!["c1"], false));

        let model: Arc<dyn TextModel> = Arc::new(MemoryModel::new("file:///x.demo", "", "demo"));
        let dispatched = registry.dispatch("x.demo", &model, 0);
        assert_eq!(dispatched.len(), 2);
        dispatched.settled().await;

        assert_eq!(store.markers("file:///x.demo", "a"), vec!["a1"]);
        assert_eq!(store.markers("file:///x.demo", "b"), vec!["b1"]);
        assert!(store.markers("file:///x.demo", "c").is_empty());
    }

    #[tokio::test]
    async fn test_unknown_language_is_noop() {
        let store: Arc<MarkerStore<&'static str>> = Arc::new(MarkerStore::new());
        let registry = DiagnosticRegistry::new(store.clone());

        let model: Arc<dyn TextModel> =
            Arc::new(MemoryModel::new("file:///x.txt", "", "plaintext"));
        let dispatched = registry.dispatch("x.txt", &model, 0);
        assert!(dispatched.is_empty());
        dispatched.settled().await;
        assert!(store.models().is_empty());
    }

    #[tokio::test]
    async fn test_failing_driver_does_not_affect_siblings() {
        let store: Arc<MarkerStore<&'static str>> = Arc::new(MarkerStore::new());
        let registry = DiagnosticRegistry::new(store.clone());
        registry.register("demo", fixed("broken", vec![], true));
        registry.register("demo", fixed("healthy", vec!["ok"], false));

        let model: Arc<dyn TextModel> = Arc::new(MemoryModel::new("file:///x.demo", "", "demo"));
        registry.dispatch("x.demo", &model, 0).settled().await;

        assert_eq!(store.markers("file:///x.demo", "healthy"), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_same_provider_twice_gets_independent_drivers() {
        let store: Arc<MarkerStore<&'static str>> = Arc::new(MarkerStore::new());
        let registry = DiagnosticRegistry::new(store);
        let provider = fixed("dup", vec!["m"], false);

        let first = registry.register("demo", provider.clone());
        let second = registry.register("demo", provider);
        assert_eq!(registry.owners("demo"), vec!["dup", "dup"]);

        let model: Arc<dyn TextModel> = Arc::new(MemoryModel::new("file:///x.demo", "", "demo"));
        registry.dispatch("x.demo", &model, 0).settled().await;

        assert_ne!(first.generation(), second.generation());
        assert_eq!(first.published_markers(), vec!["m"]);
        assert_eq!(second.published_markers(), vec!["m"]);
    }

    #[test]
    fn test_languages_sorted() {
        let store: Arc<MarkerStore<&'static str>> = Arc::new(MarkerStore::new());
        let registry = DiagnosticRegistry::new(store);
        registry.register("zeta", fixed("z", vec![], false));
        registry.register("alpha", fixed("a", vec![], false));
        assert_eq!(registry.languages(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_dispatch_outside_runtime_starts_nothing() {
        let store: Arc<MarkerStore<&'static str>> = Arc::new(MarkerStore::new());
        let registry = DiagnosticRegistry::new(store.clone());
        registry.register("demo", fixed("a", vec!["a1"], false));

        let model: Arc<dyn TextModel> = Arc::new(MemoryModel::new("file:///x.demo", "", "demo"));
        assert!(registry.dispatch("x.demo", &model, 0).is_empty());
        assert!(store.models().is_empty());
    }
}
