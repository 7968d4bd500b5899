// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! INTWC command-line harness.
//!
//! Opens files in an editor state, lets every installed diagnostic provider
//! settle, and prints the markers they published.

#![allow(clippy::print_stdout, reason = "CLI tool needs to output to stdout")]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use intwc::cli::{self, ColorConfig, ColumnWidths};
use intwc::config::Config;
use intwc::editor::EditorState;
use intwc::language::LanguageRegistry;
use intwc::lint::LintLanguage;
use intwc::marker::{Marker, MarkerStore};

/// Language used for files no installed language claims.
const FALLBACK_LANGUAGE: &str = "plaintext";

/// Command-line arguments for INTWC.
#[derive(Parser, Debug)]
#[command(name = "intwc")]
#[command(about = "Run editor language diagnostics over files")]
#[command(version = env!("INTWC_VERSION"))]
struct Args {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

/// Subcommands supported by INTWC.
#[derive(Subcommand, Debug)]
enum Command {
    /// Open files and print the diagnostics published for them.
    /// Exits with status 1 when any error was reported.
    Check {
        /// Files to check.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print a JSON report instead of one line per marker.
        #[arg(long)]
        json: bool,

        /// Disable colored output.
        #[arg(long)]
        nocolor: bool,

        /// Report lines longer than this. Overrides the config file.
        #[arg(long)]
        max_line_length: Option<usize>,

        /// Language id to open every file with, instead of detecting it
        /// from the extension.
        #[arg(long)]
        language: Option<String>,
    },

    /// List installed languages and their capabilities.
    Languages {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Disable colored output.
        #[arg(long)]
        nocolor: bool,
    },

    /// Print the effective configuration as JSON.
    Config,
}

/// Markers of one file in the JSON report.
#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    language: String,
    markers: Vec<OwnedMarker>,
}

#[derive(Debug, Serialize)]
struct OwnedMarker {
    owner: String,
    #[serde(flatten)]
    marker: Marker,
}

/// Entry point for the `intwc` binary.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the subcommand
/// fails.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("intwc=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(args.config)?;

    match args.command {
        Command::Check {
            files,
            json,
            nocolor,
            max_line_length,
            language,
        } => {
            // CLI flags override config values
            if let Some(limit) = max_line_length {
                config.lint.max_line_length = limit;
            }
            run_check(&config, &files, language.as_deref(), json, nocolor).await
        }
        Command::Languages { json, nocolor } => {
            run_languages(&config, json, nocolor)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Builds an editor with every built-in language installed.
fn build_editor(config: &Config) -> Result<EditorState> {
    let store: Arc<MarkerStore<Marker>> = Arc::new(MarkerStore::new());
    let languages = Arc::new(LanguageRegistry::new(store.clone()));
    languages.install(&LintLanguage::new(&config.lint)?)?;
    Ok(EditorState::new(languages, store, config.editor.clone()))
}

/// Checks files and prints their markers.
///
/// # Errors
///
/// Returns an error if a file cannot be read or opened.
async fn run_check(
    config: &Config,
    files: &[PathBuf],
    language: Option<&str>,
    json: bool,
    nocolor: bool,
) -> Result<ExitCode> {
    let editor = build_editor(config)?;
    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        let content = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let language = language
            .map(str::to_string)
            .or_else(|| editor.languages().language_for_path(file))
            .unwrap_or_else(|| FALLBACK_LANGUAGE.to_string());
        debug!("Checking {} as {}", file.display(), language);

        let name = file.to_string_lossy();
        editor
            .open_file(&name, &content, &language)?
            .settled()
            .await;

        let mut markers: Vec<OwnedMarker> = editor
            .markers(&name)
            .into_iter()
            .flat_map(|(owner, markers)| {
                markers.into_iter().map(move |marker| OwnedMarker {
                    owner: owner.clone(),
                    marker,
                })
            })
            .collect();
        markers.sort_by_key(|m| (m.marker.range.start.line, m.marker.range.start.character));

        reports.push(FileReport {
            path: file.display().to_string(),
            language,
            markers,
        });
    }
    editor.dispose();

    let errors = reports
        .iter()
        .flat_map(|report| &report.markers)
        .filter(|m| cli::severity_label(m.marker.severity) == "error")
        .count();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_reports(&reports, errors, &ColorConfig::new(nocolor));
    }

    Ok(if errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_reports(reports: &[FileReport], errors: usize, colors: &ColorConfig) {
    let mut total = 0usize;
    for report in reports {
        for owned in &report.markers {
            println!(
                "{}",
                cli::format_marker(&report.path, &owned.owner, &owned.marker, colors)
            );
        }
        total += report.markers.len();
    }

    let summary = format!(
        "{} file{} checked, {} problem{} ({} error{})",
        reports.len(),
        plural(reports.len()),
        total,
        plural(total),
        errors,
        plural(errors),
    );
    if errors > 0 {
        println!("{}", colors.red(&summary));
    } else {
        println!("{}", colors.dim(&summary));
    }
}

const fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Lists installed languages.
///
/// # Errors
///
/// Returns an error if the built-in languages fail to install.
fn run_languages(config: &Config, json: bool, nocolor: bool) -> Result<()> {
    let editor = build_editor(config)?;
    let languages = editor.languages().languages();

    if json {
        println!("{}", serde_json::to_string_pretty(&languages)?);
        return Ok(());
    }

    let colors = ColorConfig::new(nocolor);
    let term_width = cli::terminal_width();
    let widths = ColumnWidths::calculate(term_width);

    println!(
        "{:<width_lang$} {:<width_ext$} {:<width_caps$} PROVIDERS",
        "LANGUAGE",
        "EXTENSIONS",
        "CAPABILITIES",
        width_lang = widths.language,
        width_ext = widths.extensions,
        width_caps = widths.capabilities,
    );
    println!("{}", "-".repeat(term_width.min(120)));

    for info in &languages {
        let extensions = cli::truncate(&info.extensions.join(","), widths.extensions);
        let capabilities = cli::truncate(
            &info
                .capabilities
                .iter()
                .map(|kind| kind.as_str())
                .collect::<Vec<_>>()
                .join(","),
            widths.capabilities,
        );
        let providers = if info.diagnostic_owners.is_empty() {
            "-".to_string()
        } else {
            cli::truncate(&info.diagnostic_owners.join(","), widths.providers)
        };

        // Pad before coloring so escape codes don't skew the columns
        let id = format!(
            "{:<width$}",
            cli::truncate(&info.id, widths.language),
            width = widths.language
        );
        println!(
            "{} {:<width_ext$} {:<width_caps$} {}",
            colors.cyan(&id),
            extensions,
            capabilities,
            providers,
            width_ext = widths.extensions,
            width_caps = widths.capabilities,
        );
    }

    Ok(())
}
