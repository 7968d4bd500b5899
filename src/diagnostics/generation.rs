// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Request generation tokens.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of tokens, shared by every driver.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Identity of one diagnostic request cycle.
///
/// Tokens are allocated from a single 64-bit counter and never repeat within
/// a process. [`Generation::NONE`] is reserved and never allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The invalid token every driver starts with.
    pub const NONE: Self = Self(0);

    /// Allocates a fresh token, strictly greater than every token handed out
    /// before it.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }

    /// Whether this is the reserved invalid token.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_strictly_increase() {
        let first = Generation::next();
        let second = Generation::next();
        assert!(second > first);
        assert!(!first.is_none());
        assert!(first > Generation::NONE);
    }

    #[test]
    fn test_tokens_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| (0..250).map(|_| Generation::next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            if let Ok(tokens) = handle.join() {
                all.extend(tokens);
            }
        }
        assert_eq!(all.len(), 1000);
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }

    #[test]
    fn test_default_is_none() {
        assert!(Generation::default().is_none());
        assert_eq!(Generation::NONE.to_string(), "g0");
    }
}
