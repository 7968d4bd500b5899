// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Diagnostic aggregation engine.
//!
//! Language services implement [`DiagnosticProvider`]. Each registration in
//! a [`DiagnosticRegistry`] gets its own [`DiagnosticDriver`], which runs
//! request cycles, discards stale or closed-model results, merges streamed
//! batches through the provider's merge policy, and publishes markers under
//! the provider's owner tag.

/// Request cycle state machine.
pub mod driver;
/// Provider failure type.
pub mod error;
/// Request generation tokens.
pub mod generation;
/// Reusable merge policies.
pub mod merge;
/// Provider contract.
pub mod provider;
/// Language registry and dispatch.
pub mod registry;
/// Asynchronous units of work.
pub mod task;

pub use driver::{CycleOutcome, DiagnosticDriver};
pub use error::DiagnosticError;
pub use generation::Generation;
pub use merge::{MergePolicy, OrderedMerge, OrderedSpan, ReplaceAll};
pub use provider::{DiagnosticProvider, Merged};
pub use registry::{DiagnosticRegistry, Dispatched};
pub use task::{DiagnosticTask, TaskResolver, TaskResult};
