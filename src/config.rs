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

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Effective configuration after all layers are merged.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Editor model options
    #[serde(default)]
    pub editor: EditorOptions,

    /// Settings of the built-in plain-text lint language
    #[serde(default)]
    pub lint: LintConfig,
}

/// Options applied to every model the editor state opens.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    /// Indentation width in columns (default: 2)
    #[serde(default = "default_tab_size")]
    pub tab_size: u32,

    /// Indent with spaces rather than tabs (default: true)
    #[serde(default = "default_true")]
    pub insert_spaces: bool,

    /// Remove auto-inserted trailing whitespace (default: true)
    #[serde(default = "default_true")]
    pub trim_auto_whitespace: bool,

    /// Also dispatch diagnostics when the cursor moves (default: false)
    #[serde(default)]
    pub dispatch_on_cursor: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            tab_size: default_tab_size(),
            insert_spaces: true,
            trim_auto_whitespace: true,
            dispatch_on_cursor: false,
        }
    }
}

/// `[lint]` section.
///
/// Read once when the lint language is installed; changing it afterwards
/// has no effect on installed providers.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LintConfig {
    /// Lines longer than this (in characters) are reported (default: 100)
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Lines per streamed whitespace task (default: 200)
    #[serde(default = "default_chunk_lines")]
    pub chunk_lines: usize,

    /// Report TODO and FIXME notes (default: true)
    #[serde(default = "default_true")]
    pub flag_todo: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            chunk_lines: default_chunk_lines(),
            flag_todo: true,
        }
    }
}

const fn default_tab_size() -> u32 {
    2
}

const fn default_max_line_length() -> usize {
    100
}

const fn default_chunk_lines() -> usize {
    200
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from standard paths or a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or a value has the wrong
    /// type.
    pub fn load(explicit_file: Option<PathBuf>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // 1. Start with defaults
        builder = builder
            .set_default("editor.tab_size", default_tab_size())?
            .set_default("editor.insert_spaces", true)?
            .set_default("editor.trim_auto_whitespace", true)?
            .set_default("editor.dispatch_on_cursor", false)?
            .set_default("lint.max_line_length", default_max_line_length() as u64)?
            .set_default("lint.chunk_lines", default_chunk_lines() as u64)?
            .set_default("lint.flag_todo", true)?;

        // 2. Load from user config directory (~/.config/intwc/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("intwc").join("config.toml");
            if config_path.exists() {
                builder = builder.add_source(config::File::from(config_path));
            }
        }

        // 3. Load from explicit file if provided
        if let Some(path) = explicit_file {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(config::File::from(path));
        }

        // 4. Load from environment variables (INTWC_LINT__MAX_LINE_LENGTH, etc.)
        builder = builder.add_source(
            config::Environment::with_prefix("INTWC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.lint.chunk_lines == 0 {
            anyhow::bail!("lint.chunk_lines must be at least 1");
        }
        if self.editor.tab_size == 0 {
            anyhow::bail!("editor.tab_size must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.editor.tab_size, 2);
        assert!(config.editor.insert_spaces);
        assert!(config.editor.trim_auto_whitespace);
        assert!(!config.editor.dispatch_on_cursor);
        assert_eq!(config.lint.max_line_length, 100);
        assert_eq!(config.lint.chunk_lines, 200);
        assert!(config.lint.flag_todo);
    }

    #[test]
    fn test_partial_sections_fill_defaults() -> Result<()> {
        let config: Config = toml::from_str("[lint]\nmax_line_length = 80\n")?;
        assert_eq!(config.lint.max_line_length, 80);
        assert_eq!(config.lint.chunk_lines, 200);
        assert_eq!(config.editor, EditorOptions::default());
        Ok(())
    }

    #[test]
    fn test_zero_chunk_lines_rejected() {
        let mut config = Config::default();
        config.lint.chunk_lines = 0;
        assert!(config.validate().is_err());
    }
}
