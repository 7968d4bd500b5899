// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! INTWC is the glue between a host application and an embedded code
//! editor.
//!
//! It keeps the editor state (open files, cursor, change events), installs
//! language integrations by capability, and runs their diagnostic providers
//! through an incremental aggregation engine that never lets a stale or
//! closed-model result reach the marker sink.

/// Terminal output helpers for the command-line harness.
pub mod cli;
/// Layered configuration.
pub mod config;
/// The diagnostic aggregation engine.
pub mod diagnostics;
/// Editor state and file management.
pub mod editor;
/// Observer lists and editor events.
pub mod events;
/// Language integrations and their capabilities.
pub mod language;
/// Built-in plain-text lint language.
pub mod lint;
/// Marker sinks and the in-memory marker store.
pub mod marker;
/// Text model abstraction.
pub mod model;
/// Offset and position conversions.
pub mod text;
