// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Reusable merge policies.
//!
//! Providers own their merge semantics. These policies cover the two common
//! shapes: whole-document analysis ([`ReplaceAll`]) and analysis streamed in
//! ordered slices ([`OrderedMerge`]).

use super::provider::Merged;

/// A pure reconciliation of accepted data with a new batch.
pub trait MergePolicy<T, D> {
    /// Computes the next accepted data and markers.
    fn merge(
        &self,
        current: &[T],
        new_batch: &[T],
        previous_batch: &[T],
        current_markers: &[D],
    ) -> Merged<T, D>;
}

/// Every batch replaces the whole published set. Data items are the markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceAll;

impl<D: Clone> MergePolicy<D, D> for ReplaceAll {
    fn merge(
        &self,
        _current: &[D],
        new_batch: &[D],
        _previous: &[D],
        _markers: &[D],
    ) -> Merged<D, D> {
        Merged::new(new_batch.to_vec(), new_batch.to_vec())
    }
}

/// Markers produced for one slice of an ordered analysis.
///
/// The meaning of an order is up to the language service (a chunk index, a
/// pass number, a line). A span replaces every accepted span whose
/// `to_order` falls in `[from_order, to_order]`; accepted spans outside that
/// window survive, so a partial result never clears parts of the document it
/// did not look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedSpan<D> {
    /// Lowest order cleared by this span. `None` clears everything up to
    /// `to_order`.
    pub from_order: Option<i64>,
    /// Order of this span's markers.
    pub to_order: i64,
    /// Markers found in this slice.
    pub markers: Vec<D>,
}

impl<D> OrderedSpan<D> {
    /// A span that clears everything at or below `to_order`.
    #[must_use]
    pub const fn new(to_order: i64, markers: Vec<D>) -> Self {
        Self {
            from_order: None,
            to_order,
            markers,
        }
    }

    /// Restricts the cleared window to start at `from_order`.
    #[must_use]
    pub const fn clearing_from(mut self, from_order: i64) -> Self {
        self.from_order = Some(from_order);
        self
    }

    /// A span covering exactly one order.
    #[must_use]
    pub const fn exact(order: i64, markers: Vec<D>) -> Self {
        Self::new(order, markers).clearing_from(order)
    }

    /// Whether accepting this span removes an accepted span of `order`.
    #[must_use]
    pub fn clears(&self, order: i64) -> bool {
        order >= self.from_order.unwrap_or(i64::MIN) && order <= self.to_order
    }
}

/// Merges [`OrderedSpan`]s by order window.
///
/// Accepted spans are kept sorted by `to_order` (stable), so re-applying a
/// batch is idempotent and the finalization pass publishes an unchanged set.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedMerge;

impl<D: Clone> MergePolicy<OrderedSpan<D>, D> for OrderedMerge {
    fn merge(
        &self,
        current: &[OrderedSpan<D>],
        new_batch: &[OrderedSpan<D>],
        _previous: &[OrderedSpan<D>],
        _markers: &[D],
    ) -> Merged<OrderedSpan<D>, D> {
        let mut data: Vec<OrderedSpan<D>> = current
            .iter()
            .filter(|kept| !new_batch.iter().any(|span| span.clears(kept.to_order)))
            .cloned()
            .collect();
        data.extend(new_batch.iter().cloned());
        data.sort_by_key(|span| span.to_order);

        let markers = data
            .iter()
            .flat_map(|span| span.markers.iter().cloned())
            .collect();
        Merged::new(data, markers)
    }
}
