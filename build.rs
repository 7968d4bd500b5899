// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Build script that embeds the version shown by `intwc --version`.
//!
//! On a tagged release commit this is the package version. Otherwise the
//! output of `git describe --tags --always --dirty` is appended, e.g.
//! `0.4.2 (0.4.2-3-gabc1234-dirty)`. Without git it is just the package
//! version.

use std::process::Command;

fn main() {
    // Rebuild when the git HEAD changes (new commit, checkout, etc.)
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    let package = env!("CARGO_PKG_VERSION");
    let version = match git_describe() {
        Some(desc) if desc != package => format!("{package} ({desc})"),
        _ => package.to_string(),
    };
    println!("cargo:rustc-env=INTWC_VERSION={version}");
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let desc = String::from_utf8(output.stdout).ok()?;
    let desc = desc.trim();
    // Tags are written as v0.4.2
    let desc = desc.strip_prefix('v').unwrap_or(desc);
    (!desc.is_empty()).then(|| desc.to_string())
}
