//! Fan-out output edges.

use chamber_core::{OrderId, Value};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::processor::Processor;

/// One consumer of an edge
#[derive(Clone)]
struct Target {
    processor: Arc<Processor>,
    slot: usize,
}

impl Target {
    fn is(&self, processor: &Arc<Processor>, slot: usize) -> bool {
        Arc::ptr_eq(&self.processor, processor) && self.slot == slot
    }
}

/// Output edge delivering each value to every bound input slot
///
/// Delivery is synchronous: `push` returns once every consumer has accepted
/// or refused the value, possibly after blocking on a consumer's window.
pub struct DistributorVariable {
    name: String,
    targets: RwLock<Vec<Target>>,
}

impl DistributorVariable {
    /// Create an unbound edge
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            targets: RwLock::new(Vec::new()),
        }
    }

    /// Variable name the edge was declared under
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bound consumers
    #[must_use]
    pub fn fan_out(&self) -> usize {
        self.targets.read().len()
    }

    /// Bind a consumer's input slot; binding the same pair twice is a no-op
    pub fn bind(&self, processor: &Arc<Processor>, slot: usize) {
        let mut targets = self.targets.write();
        if targets.iter().any(|t| t.is(processor, slot)) {
            return;
        }
        targets.push(Target {
            processor: Arc::clone(processor),
            slot,
        });
    }

    /// Deliver `value` tagged `order` to every consumer
    ///
    /// Returns false if any consumer has already finished. Every consumer
    /// is still offered the value.
    pub fn push(&self, value: &Value, order: OrderId) -> bool {
        let targets = self.targets.read().clone();
        let mut accepted = true;
        for target in &targets {
            accepted &= target.processor.put_data(target.slot, value.clone(), order);
        }
        accepted
    }

    /// Announce that no order at or past `order` will follow
    pub fn push_stop(&self, order: u64) {
        tracing::debug!(variable = %self.name, order, "broadcasting stop");
        let targets = self.targets.read().clone();
        for target in &targets {
            target.processor.put_stop_request(order);
        }
    }
}

impl std::fmt::Debug for DistributorVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributorVariable")
            .field("name", &self.name)
            .field("fan_out", &self.fan_out())
            .finish()
    }
}
