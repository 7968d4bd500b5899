/*
 * Copyright (C) 2026 Mark Wells Dev
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Terminal output for the `intwc` binary: colors, marker lines and the
//! languages table.

use crossterm::tty::IsTty;
use lsp_types::{DiagnosticSeverity, NumberOrString};
use std::io::stdout;

use crate::marker::Marker;

/// Configuration for color output
#[derive(Debug, Clone)]
pub struct ColorConfig {
    /// Whether ANSI colour codes are emitted
    pub enabled: bool,
}

impl ColorConfig {
    /// Create a new ColorConfig, auto-detecting TTY unless nocolor is true
    #[must_use]
    pub fn new(nocolor: bool) -> Self {
        Self {
            enabled: !nocolor && stdout().is_tty(),
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    /// Red (errors)
    #[must_use]
    pub fn red(&self, s: &str) -> String {
        self.paint("31", s)
    }

    /// Yellow (warnings)
    #[must_use]
    pub fn yellow(&self, s: &str) -> String {
        self.paint("33", s)
    }

    /// Cyan (information, language names)
    #[must_use]
    pub fn cyan(&self, s: &str) -> String {
        self.paint("36", s)
    }

    /// Dim text (hints, owners)
    #[must_use]
    pub fn dim(&self, s: &str) -> String {
        self.paint("2", s)
    }

    /// Bold text (file names)
    #[must_use]
    pub fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }

    /// Severity label in its color
    #[must_use]
    pub fn severity(&self, severity: Option<DiagnosticSeverity>) -> String {
        let label = severity_label(severity);
        match severity {
            Some(DiagnosticSeverity::ERROR) => self.red(label),
            Some(DiagnosticSeverity::WARNING) => self.yellow(label),
            Some(DiagnosticSeverity::INFORMATION) => self.cyan(label),
            _ => self.dim(label),
        }
    }
}

/// Lowercase severity name; markers without one count as errors, as in LSP
#[must_use]
pub fn severity_label(severity: Option<DiagnosticSeverity>) -> &'static str {
    match severity {
        None | Some(DiagnosticSeverity::ERROR) => "error",
        Some(DiagnosticSeverity::WARNING) => "warning",
        Some(DiagnosticSeverity::INFORMATION) => "info",
        Some(_) => "hint",
    }
}

/// One marker as `path:line:col severity [owner] message`, 1-based
#[must_use]
pub fn format_marker(path: &str, owner: &str, marker: &Marker, colors: &ColorConfig) -> String {
    let code = match &marker.code {
        Some(NumberOrString::String(code)) => format!(" ({code})"),
        Some(NumberOrString::Number(code)) => format!(" ({code})"),
        None => String::new(),
    };
    format!(
        "{}:{}:{} {} {} {}{}",
        colors.bold(path),
        marker.range.start.line + 1,
        marker.range.start.character + 1,
        colors.severity(marker.severity),
        colors.dim(&format!("[{owner}]")),
        marker.message,
        colors.dim(&code),
    )
}

/// Get the terminal width, defaulting to 80 if unable to detect
#[must_use]
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| usize::from(w))
        .unwrap_or(80)
}

/// Truncate a string to max_len characters, adding "..." if truncated
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if max_len <= 3 {
        return ".".repeat(max_len.min(3));
    }
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Column width configuration for the languages command
#[derive(Debug)]
pub struct ColumnWidths {
    /// LANGUAGE column
    pub language: usize,
    /// EXTENSIONS column
    pub extensions: usize,
    /// CAPABILITIES column
    pub capabilities: usize,
    /// PROVIDERS column
    pub providers: usize,
}

impl ColumnWidths {
    /// Calculate column widths based on terminal width
    /// Columns: LANGUAGE | EXTENSIONS | CAPABILITIES | PROVIDERS
    #[must_use]
    pub fn calculate(term_width: usize) -> Self {
        let language = 16;
        let extensions = 14;

        // Reserve space for separators (3 spaces between columns)
        let fixed_space = language + extensions + 3;
        let flexible_space = term_width.saturating_sub(fixed_space);

        let min_capabilities = 24;
        let min_providers = 20;
        let total_min_flex = min_capabilities + min_providers;

        if flexible_space <= total_min_flex {
            Self {
                language,
                extensions,
                capabilities: min_capabilities,
                providers: min_providers,
            }
        } else {
            // Distribute extra space primarily to providers
            let extra = flexible_space - total_min_flex;
            Self {
                language,
                extensions,
                capabilities: min_capabilities + extra / 4,
                providers: min_providers + extra - extra / 4,
            }
        }
    }
}
