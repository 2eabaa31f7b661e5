//! Throttled policy: the first available worker wins.

use crate::core::error::BrokerError;
use crate::core::event::{DomainEvent, EventListener};
use crate::core::policy::{Admission, LoadBalancingPolicy, PolicyKind};
use crate::core::worker_table::WorkerTable;
use crate::util::serde::WorkerId;

/// Returns the lowest-id available worker, throttling each worker to one
/// outstanding unit of work.
pub struct FirstAvailablePolicy {
    table: WorkerTable,
}

impl FirstAvailablePolicy {
    /// Create a policy over the given table.
    #[must_use]
    pub const fn new(table: WorkerTable) -> Self {
        Self { table }
    }
}

impl LoadBalancingPolicy for FirstAvailablePolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::FirstAvailable
    }

    fn select_worker(&mut self, admission: Admission<'_>) -> Option<WorkerId> {
        let mut table = self.table.lock();
        let worker = table
            .known_workers()
            .find(|id| table.is_available(*id) && admission.admits(&table, *id))?;
        table.mark_allocated(worker);
        Some(worker)
    }
}

impl EventListener for FirstAvailablePolicy {
    fn on_event(&mut self, _event: &DomainEvent) -> Result<(), BrokerError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "first-available"
    }
}
