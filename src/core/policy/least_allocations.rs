//! Spread work by cumulative allocation count.

use crate::core::error::BrokerError;
use crate::core::event::{DomainEvent, EventListener};
use crate::core::policy::{Admission, LoadBalancingPolicy, PolicyKind};
use crate::core::worker_table::WorkerTable;
use crate::util::serde::WorkerId;

/// Prefers workers that were never allocated, then the smallest allocation
/// count. Ties go to the earliest worker in enumeration order.
pub struct LeastAllocationsPolicy {
    table: WorkerTable,
}

impl LeastAllocationsPolicy {
    /// Create a policy over the given table.
    #[must_use]
    pub const fn new(table: WorkerTable) -> Self {
        Self { table }
    }
}

impl LoadBalancingPolicy for LeastAllocationsPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::LeastAllocations
    }

    fn select_worker(&mut self, admission: Admission<'_>) -> Option<WorkerId> {
        let mut table = self.table.lock();
        let candidates: Vec<WorkerId> = table
            .known_workers()
            .filter(|id| admission.admits(&table, *id))
            .collect();

        let worker = candidates
            .iter()
            .copied()
            .find(|id| !table.has_allocation(*id))
            .or_else(|| {
                candidates
                    .iter()
                    .copied()
                    .min_by_key(|id| table.allocation_count(*id))
            })?;

        table.mark_allocated(worker);
        Some(worker)
    }
}

impl EventListener for LeastAllocationsPolicy {
    fn on_event(&mut self, _event: &DomainEvent) -> Result<(), BrokerError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "least-allocations"
    }
}
