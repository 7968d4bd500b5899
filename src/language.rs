// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Language integrations.
//!
//! A [`LanguageClient`] declares the capabilities it implements. The
//! [`LanguageRegistry`] installs each client once: it records the language
//! and its file extensions, wires diagnostic providers into the shared
//! [`DiagnosticRegistry`], and keeps the capability set for host queries.

use anyhow::{Result, bail};
use lsp_types::SemanticTokensLegend;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::diagnostics::{DiagnosticProvider, DiagnosticRegistry};
use crate::marker::MarkerSink;

/// Kinds of capability a language can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    /// Syntax tokenizer.
    Tokenizer,
    /// Brackets, comments and auto-closing configuration.
    Configuration,
    /// Diagnostic providers.
    Diagnostics,
    /// Semantic highlighting.
    SemanticTokens,
    /// Completion items.
    Completion,
}

impl CapabilityKind {
    /// Short name used in listings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tokenizer => "tokenizer",
            Self::Configuration => "configuration",
            Self::Diagnostics => "diagnostics",
            Self::SemanticTokens => "semantic-tokens",
            Self::Completion => "completion",
        }
    }
}

/// A diagnostic provider with its data type erased, ready to register.
pub struct DiagnosticCapability<D> {
    owner: String,
    install: Box<dyn Fn(&DiagnosticRegistry<D>, &str) + Send + Sync>,
}

impl<D: Send + 'static> DiagnosticCapability<D> {
    /// Wraps a provider publishing markers of type `D`.
    pub fn new<P>(provider: Arc<P>) -> Self
    where
        P: DiagnosticProvider<Marker = D>,
    {
        let owner = provider.owner_id().to_string();
        Self {
            owner,
            install: Box::new(move |registry, language_id| {
                registry.register(language_id, Arc::clone(&provider));
            }),
        }
    }

    /// Owner tag of the wrapped provider.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner
    }
}

/// One capability implemented by a language client.
///
/// Pieces that only work together travel together: a semantic token
/// provider cannot be declared without its legend.
pub enum Capability<D> {
    /// The language ships a tokenizer.
    Tokenizer,
    /// The language ships an editing configuration.
    Configuration,
    /// Diagnostic providers, each registered as an independent driver.
    Diagnostics(Vec<DiagnosticCapability<D>>),
    /// Semantic highlighting with its token legend.
    SemanticTokens {
        /// Token types and modifiers the provider emits.
        legend: SemanticTokensLegend,
    },
    /// Completion with the characters that trigger it.
    Completion {
        /// Characters that open the completion list.
        trigger_characters: Vec<String>,
    },
}

impl<D> Capability<D> {
    /// The kind of this capability.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        match self {
            Self::Tokenizer => CapabilityKind::Tokenizer,
            Self::Configuration => CapabilityKind::Configuration,
            Self::Diagnostics(_) => CapabilityKind::Diagnostics,
            Self::SemanticTokens { .. } => CapabilityKind::SemanticTokens,
            Self::Completion { .. } => CapabilityKind::Completion,
        }
    }
}

/// A language integration.
pub trait LanguageClient<D>: Send + Sync {
    /// Language identifier, e.g. `"rust"`.
    fn id(&self) -> &str;

    /// File extensions (without the dot) associated with the language.
    fn extensions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Capabilities implemented by this client.
    fn capabilities(&self) -> Vec<Capability<D>>;
}

/// What the host knows about an installed language.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageInfo {
    /// Language identifier.
    pub id: String,
    /// Associated file extensions, lowercase.
    pub extensions: Vec<String>,
    /// Declared capabilities, sorted.
    pub capabilities: Vec<CapabilityKind>,
    /// Owner tags of the diagnostic providers, in registration order.
    pub diagnostic_owners: Vec<String>,
    /// Semantic token legend, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_legend: Option<SemanticTokensLegend>,
    /// Completion trigger characters.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub completion_triggers: Vec<String>,
}

/// Installed languages and their diagnostic registry.
pub struct LanguageRegistry<D> {
    diagnostics: Arc<DiagnosticRegistry<D>>,
    languages: RwLock<BTreeMap<String, LanguageInfo>>,
}

impl<D: Send + 'static> LanguageRegistry<D> {
    /// Creates an empty registry whose providers publish into `sink`.
    pub fn new(sink: Arc<dyn MarkerSink<D>>) -> Self {
        Self {
            diagnostics: Arc::new(DiagnosticRegistry::new(sink)),
            languages: RwLock::new(BTreeMap::new()),
        }
    }

    /// The diagnostic registry shared by all installed languages.
    #[must_use]
    pub const fn diagnostics(&self) -> &Arc<DiagnosticRegistry<D>> {
        &self.diagnostics
    }

    /// Installs a language client.
    ///
    /// # Errors
    ///
    /// Returns an error if a language with the same id is already installed.
    pub fn install(&self, client: &dyn LanguageClient<D>) -> Result<()> {
        let id = client.id().to_string();
        let mut languages = self
            .languages
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if languages.contains_key(&id) {
            bail!("Language '{id}' is already installed");
        }

        let mut info = LanguageInfo {
            id: id.clone(),
            extensions: client
                .extensions()
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            capabilities: Vec::new(),
            diagnostic_owners: Vec::new(),
            semantic_legend: None,
            completion_triggers: Vec::new(),
        };

        for capability in client.capabilities() {
            let kind = capability.kind();
            match capability {
                Capability::Diagnostics(providers) => {
                    for provider in providers {
                        (provider.install)(self.diagnostics.as_ref(), id.as_str());
                        info.diagnostic_owners.push(provider.owner);
                    }
                }
                Capability::SemanticTokens { legend } => info.semantic_legend = Some(legend),
                Capability::Completion { trigger_characters } => {
                    info.completion_triggers = trigger_characters;
                }
                Capability::Tokenizer | Capability::Configuration => {}
            }
            if !info.capabilities.contains(&kind) {
                info.capabilities.push(kind);
            }
        }
        info.capabilities.sort();

        info!(
            "Installed language {} ({} diagnostic providers, capabilities: {})",
            id,
            info.diagnostic_owners.len(),
            info.capabilities
                .iter()
                .map(|kind| kind.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        languages.insert(id, info);
        drop(languages);
        Ok(())
    }

    /// Whether `language_id` is installed with `kind`.
    #[must_use]
    pub fn has_capability(&self, language_id: &str, kind: CapabilityKind) -> bool {
        self.language(language_id)
            .is_some_and(|info| info.capabilities.contains(&kind))
    }

    /// Information about one installed language.
    #[must_use]
    pub fn language(&self, language_id: &str) -> Option<LanguageInfo> {
        self.languages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(language_id)
            .cloned()
    }

    /// All installed languages, sorted by id.
    #[must_use]
    pub fn languages(&self) -> Vec<LanguageInfo> {
        self.languages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// The installed language claiming the extension of `path`, if any.
    #[must_use]
    pub fn language_for_path(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.languages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|info| info.extensions.contains(&ext))
            .map(|info| info.id.clone())
    }
}
