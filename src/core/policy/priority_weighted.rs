//! Hardware-weighted priority policy.

use crate::core::error::BrokerError;
use crate::core::event::{DomainEvent, EventListener};
use crate::core::policy::{Admission, LoadBalancingPolicy, PolicyKind};
use crate::core::weights::PriorityWeightTable;
use crate::core::work::Worker;
use crate::core::worker_table::WorkerTable;
use crate::util::serde::WorkerId;

/// Scans a fixed descending-by-weight ordering and returns the first
/// available worker.
///
/// The ordering is computed when every worker has been provisioned; until
/// then the policy reports no worker rather than guessing.
pub struct PriorityWeightedPolicy {
    table: WorkerTable,
    weights: Option<PriorityWeightTable>,
    ordering: Vec<WorkerId>,
}

impl PriorityWeightedPolicy {
    /// Create a policy over the given table, without an ordering yet.
    #[must_use]
    pub const fn new(table: WorkerTable) -> Self {
        Self {
            table,
            weights: None,
            ordering: Vec::new(),
        }
    }

    /// Recompute weights and ordering for a worker set.
    pub fn rebuild(&mut self, workers: &[Worker]) -> Result<(), BrokerError> {
        let weights = PriorityWeightTable::compute(workers)?;
        self.ordering = weights.ordering();
        for id in &self.ordering {
            tracing::info!(
                "worker #{} priority weight {}",
                id,
                weights.weight(*id).unwrap_or_default()
            );
        }
        self.weights = Some(weights);
        Ok(())
    }

    /// Fixed scan order, `None` before the weights are known.
    #[must_use]
    pub fn ordering(&self) -> Option<&[WorkerId]> {
        self.weights.as_ref().map(|_| self.ordering.as_slice())
    }

    /// Computed weights, if any.
    #[must_use]
    pub const fn weights(&self) -> Option<&PriorityWeightTable> {
        self.weights.as_ref()
    }
}

impl LoadBalancingPolicy for PriorityWeightedPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::PriorityWeighted
    }

    fn select_worker(&mut self, admission: Admission<'_>) -> Option<WorkerId> {
        if self.weights.is_none() {
            tracing::debug!("priority ordering not computed yet");
            return None;
        }
        let mut table = self.table.lock();
        let worker = self
            .ordering
            .iter()
            .copied()
            .find(|id| table.is_available(*id) && admission.admits(&table, *id))?;
        table.mark_allocated(worker);
        Some(worker)
    }
}

impl EventListener for PriorityWeightedPolicy {
    fn on_event(&mut self, event: &DomainEvent) -> Result<(), BrokerError> {
        if let DomainEvent::AllWorkersProvisioned { workers } = event {
            self.rebuild(workers)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "priority-weighted"
    }
}
