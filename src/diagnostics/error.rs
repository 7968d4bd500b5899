// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

use thiserror::Error;

/// Failure raised by a diagnostic provider during a request cycle.
///
/// Stale and disposed results are not errors; they surface as
/// [`CycleOutcome`](super::CycleOutcome) variants instead.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    /// The provider could not start a request.
    #[error("provider '{owner}' failed to start a request: {source:#}")]
    Request {
        /// Owner tag of the failing provider.
        owner: String,
        /// Error reported by the provider.
        source: anyhow::Error,
    },

    /// One of the request's tasks failed. The remainder of the cycle was
    /// skipped and the published markers were left untouched.
    #[error("task {index} of provider '{owner}' failed: {source:#}")]
    Task {
        /// Owner tag of the failing provider.
        owner: String,
        /// Position of the task in the request's task list.
        index: usize,
        /// Error reported by the task.
        source: anyhow::Error,
    },
}

impl DiagnosticError {
    /// Owner tag of the provider that failed.
    #[must_use]
    pub fn owner(&self) -> &str {
        match self {
            Self::Request { owner, .. } | Self::Task { owner, .. } => owner,
        }
    }
}
