//! Bounded reordering window.
//!
//! Tracks which of the most recently admitted order ids a processor has
//! finished, as a bitmap anchored at the oldest unfinished id. Producers may
//! only deliver ids that fall inside the window; completing the anchor
//! slides the window past every contiguous finished id.

use bitvec::prelude::*;
use chamber_core::OrderId;

/// Sliding completion bitmap
#[derive(Debug, Clone)]
pub struct CompletionWindow {
    /// Oldest order id not yet completed
    anchor: OrderId,
    /// Completion flags for `anchor .. anchor + capacity`
    done: BitVec<usize, Lsb0>,
}

impl CompletionWindow {
    /// Create a window spanning `capacity` order ids, starting at zero
    ///
    /// A zero capacity is raised to one so the anchor can always progress.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            anchor: OrderId::ZERO,
            done: BitVec::repeat(false, capacity.max(1)),
        }
    }

    /// Number of order ids the window spans
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.done.len()
    }

    /// Oldest order id not yet completed
    #[must_use]
    pub const fn anchor(&self) -> OrderId {
        self.anchor
    }

    /// Whether a producer may deliver `order` now
    #[must_use]
    pub fn admits(&self, order: OrderId) -> bool {
        order < self.anchor.advance(self.capacity() as u64)
    }

    /// Completed ids currently held ahead of the anchor
    #[must_use]
    pub fn pending_completions(&self) -> usize {
        self.done.count_ones()
    }

    /// Record `order` as completed; returns how far the anchor moved
    ///
    /// Ids behind the anchor are already accounted for and ignored. Ids
    /// beyond the window were never admitted and are ignored too.
    pub fn complete(&mut self, order: OrderId) -> u64 {
        let Some(offset) = order.offset_from(self.anchor) else {
            return 0;
        };
        let Ok(index) = usize::try_from(offset) else {
            return 0;
        };
        if index >= self.done.len() {
            tracing::debug!(%order, anchor = %self.anchor, "completion outside window ignored");
            return 0;
        }

        self.done.set(index, true);
        let shift = self.done.leading_ones();
        if shift > 0 {
            self.done.shift_left(shift);
            self.anchor = self.anchor.advance(shift as u64);
        }
        shift as u64
    }
}
