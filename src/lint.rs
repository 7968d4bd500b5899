// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Built-in plain-text lint language.
//!
//! Two providers run under the `plaintext-lint` language:
//!
//! - `lint/whitespace` scans the document in chunks of lines, one task per
//!   chunk, each on the blocking pool. Results stream in chunk order and are
//!   merged with [`OrderedMerge`], so an edit only replaces the chunks that
//!   were rescanned.
//! - `lint/style` scans the whole document in one task and replaces its
//!   markers wholesale.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range};
use regex::Regex;
use std::sync::Arc;
use tracing::trace;

use crate::config::LintConfig;
use crate::diagnostics::{
    DiagnosticProvider, DiagnosticTask, MergePolicy, Merged, OrderedMerge, OrderedSpan, ReplaceAll,
};
use crate::language::{Capability, DiagnosticCapability, LanguageClient};
use crate::marker::Marker;
use crate::model::TextModel;

/// Language id of the lint language.
pub const LANGUAGE_ID: &str = "plaintext-lint";

/// `source` field of every lint marker.
pub const SOURCE: &str = "intwc-lint";

/// Owner tag of the whitespace provider.
pub const WHITESPACE_OWNER: &str = "lint/whitespace";

/// Owner tag of the style provider.
pub const STYLE_OWNER: &str = "lint/style";

/// The plain-text lint language client.
pub struct LintLanguage {
    whitespace: Arc<WhitespaceProvider>,
    style: Arc<StyleProvider>,
}

impl LintLanguage {
    /// Builds the language from lint settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule pattern fails to compile.
    pub fn new(config: &LintConfig) -> Result<Self> {
        Ok(Self {
            whitespace: Arc::new(WhitespaceProvider::new(config.chunk_lines)),
            style: Arc::new(StyleProvider::new(config.max_line_length, config.flag_todo)?),
        })
    }
}

impl LanguageClient<Marker> for LintLanguage {
    fn id(&self) -> &str {
        LANGUAGE_ID
    }

    fn extensions(&self) -> Vec<String> {
        vec!["txt".to_string(), "md".to_string(), "log".to_string()]
    }

    fn capabilities(&self) -> Vec<Capability<Marker>> {
        vec![
            Capability::Configuration,
            Capability::Diagnostics(vec![
                DiagnosticCapability::new(Arc::clone(&self.whitespace)),
                DiagnosticCapability::new(Arc::clone(&self.style)),
            ]),
        ]
    }
}

/// Reports trailing whitespace and tab indentation, chunk by chunk.
#[derive(Debug)]
pub struct WhitespaceProvider {
    chunk_lines: usize,
}

impl WhitespaceProvider {
    /// Creates a provider scanning `chunk_lines` lines per task.
    #[must_use]
    pub fn new(chunk_lines: usize) -> Self {
        Self {
            chunk_lines: chunk_lines.max(1),
        }
    }
}

#[async_trait]
impl DiagnosticProvider for WhitespaceProvider {
    type Data = OrderedSpan<Marker>;
    type Marker = Marker;

    fn owner_id(&self) -> &str {
        WHITESPACE_OWNER
    }

    async fn new_request(
        &self,
        filename: &str,
        _model: &dyn TextModel,
        text: &str,
        _caret_offset: usize,
    ) -> Result<Vec<DiagnosticTask<Self::Data>>> {
        let lines: Arc<Vec<String>> = Arc::new(text.split('\n').map(str::to_string).collect());
        let chunks = lines.len().div_ceil(self.chunk_lines);
        trace!("Scanning {} in {} whitespace chunks", filename, chunks);

        let mut tasks = Vec::with_capacity(chunks);
        for index in 0..chunks {
            let start = index * self.chunk_lines;
            let end = (start + self.chunk_lines).min(lines.len());
            let order = i64::try_from(index).context("Too many chunks")?;
            let is_last = index + 1 == chunks;
            let lines = Arc::clone(&lines);

            // Started now; the driver awaits them in order
            let scan = tokio::task::spawn_blocking(move || {
                let markers = lines[start..end]
                    .iter()
                    .enumerate()
                    .flat_map(|(offset, line)| whitespace_markers(start + offset, line))
                    .collect();
                let mut spans = vec![OrderedSpan::exact(order, markers)];
                if is_last {
                    // Clears chunks past the end of a document that got shorter
                    spans.push(OrderedSpan::new(i64::MAX, Vec::new()).clearing_from(order + 1));
                }
                spans
            });
            tasks.push(DiagnosticTask::new(async move {
                let spans = scan.await.context("Whitespace scan aborted")?;
                Ok(Some(spans))
            }));
        }
        Ok(tasks)
    }

    fn merge_data(
        &self,
        _model: &dyn TextModel,
        current: &[Self::Data],
        new_batch: &[Self::Data],
        previous_batch: &[Self::Data],
        current_markers: &[Marker],
    ) -> Merged<Self::Data, Marker> {
        OrderedMerge.merge(current, new_batch, previous_batch, current_markers)
    }
}

/// Reports long lines, TODO/FIXME notes and merge conflict markers.
#[derive(Debug)]
pub struct StyleProvider {
    max_line_length: usize,
    todo: Option<Regex>,
    conflict: Regex,
}

impl StyleProvider {
    /// Creates the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule pattern fails to compile.
    pub fn new(max_line_length: usize, flag_todo: bool) -> Result<Self> {
        let todo = if flag_todo {
            Some(Regex::new(r"\b(TODO|FIXME)\b").context("Invalid TODO pattern")?)
        } else {
            None
        };
        Ok(Self {
            max_line_length,
            todo,
            conflict: Regex::new(r"^(<{7}|={7}|>{7})(\s|$)").context("Invalid conflict pattern")?,
        })
    }

    /// Markers for the whole document.
    #[must_use]
    pub fn scan(&self, text: &str) -> Vec<Marker> {
        let mut markers = Vec::new();
        for (index, raw) in text.split('\n').enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);

            if self.conflict.is_match(line) {
                markers.push(marker(
                    index,
                    0,
                    line.chars().count(),
                    DiagnosticSeverity::ERROR,
                    "conflict-marker",
                    "Merge conflict marker".to_string(),
                ));
            }

            let length = line.chars().count();
            if length > self.max_line_length {
                markers.push(marker(
                    index,
                    self.max_line_length,
                    length,
                    DiagnosticSeverity::WARNING,
                    "line-too-long",
                    format!(
                        "Line is {length} characters long (limit {})",
                        self.max_line_length
                    ),
                ));
            }

            if let Some(todo) = &self.todo {
                for found in todo.find_iter(line) {
                    let start = line[..found.start()].chars().count();
                    let end = start + found.as_str().chars().count();
                    markers.push(marker(
                        index,
                        start,
                        end,
                        DiagnosticSeverity::INFORMATION,
                        "todo",
                        format!("{} note", found.as_str()),
                    ));
                }
            }
        }
        markers
    }
}

#[async_trait]
impl DiagnosticProvider for StyleProvider {
    type Data = Marker;
    type Marker = Marker;

    fn owner_id(&self) -> &str {
        STYLE_OWNER
    }

    async fn new_request(
        &self,
        _filename: &str,
        _model: &dyn TextModel,
        text: &str,
        _caret_offset: usize,
    ) -> Result<Vec<DiagnosticTask<Marker>>> {
        Ok(vec![DiagnosticTask::ready(self.scan(text))])
    }

    fn merge_data(
        &self,
        _model: &dyn TextModel,
        current: &[Marker],
        new_batch: &[Marker],
        previous_batch: &[Marker],
        current_markers: &[Marker],
    ) -> Merged<Marker, Marker> {
        ReplaceAll.merge(current, new_batch, previous_batch, current_markers)
    }
}

/// Whitespace findings on one line.
fn whitespace_markers(index: usize, raw: &str) -> Vec<Marker> {
    let line = raw.strip_suffix('\r').unwrap_or(raw);
    let length = line.chars().count();
    let mut markers = Vec::new();

    let content = line.trim_end_matches([' ', '\t']);
    if content.len() < line.len() {
        markers.push(marker(
            index,
            content.chars().count(),
            length,
            DiagnosticSeverity::WARNING,
            "trailing-whitespace",
            "Trailing whitespace".to_string(),
        ));
    }

    // Whitespace-only lines are already reported above
    if content.is_empty() {
        return markers;
    }
    let indent: &str = &line[..line.len() - line.trim_start_matches([' ', '\t']).len()];
    if indent.contains('\t') {
        let (code, message) = if indent.contains(' ') {
            ("mixed-indentation", "Mixed tabs and spaces in indentation")
        } else {
            ("tab-indentation", "Indented with tabs")
        };
        markers.push(marker(
            index,
            0,
            indent.chars().count(),
            DiagnosticSeverity::INFORMATION,
            code,
            message.to_string(),
        ));
    }
    markers
}

fn marker(
    line: usize,
    start: usize,
    end: usize,
    severity: DiagnosticSeverity,
    code: &str,
    message: String,
) -> Marker {
    let line = to_u32(line);
    Diagnostic {
        range: Range::new(Position::new(line, to_u32(start)), Position::new(line, to_u32(end))),
        severity: Some(severity),
        code: Some(NumberOrString::String(code.to_string())),
        source: Some(SOURCE.to_string()),
        message,
        ..Diagnostic::default()
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
