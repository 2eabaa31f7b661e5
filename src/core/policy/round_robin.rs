//! Round-robin over the known workers.

use crate::core::error::BrokerError;
use crate::core::event::{DomainEvent, EventListener};
use crate::core::policy::{Admission, LoadBalancingPolicy, PolicyKind};
use crate::core::worker_table::WorkerTable;
use crate::util::serde::WorkerId;

/// Cycles through workers in enumeration order.
///
/// The cursor starts before index 0 and advances modulo the current worker
/// count, so the pool may grow between calls.
pub struct RoundRobinPolicy {
    table: WorkerTable,
    cursor: Option<usize>,
}

impl RoundRobinPolicy {
    /// Create a policy over the given table.
    #[must_use]
    pub const fn new(table: WorkerTable) -> Self {
        Self { table, cursor: None }
    }

    /// Enumeration index of the last returned worker.
    #[must_use]
    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }
}

impl LoadBalancingPolicy for RoundRobinPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::RoundRobin
    }

    fn select_worker(&mut self, admission: Admission<'_>) -> Option<WorkerId> {
        let mut table = self.table.lock();
        let workers: Vec<WorkerId> = table.known_workers().collect();
        if workers.is_empty() {
            return None;
        }

        let start = self.cursor;
        for _ in 0..workers.len() {
            let next = self.cursor.map_or(0, |c| (c + 1) % workers.len());
            self.cursor = Some(next);
            let candidate = workers[next];
            if admission.admits(&table, candidate) {
                table.mark_allocated(candidate);
                return Some(candidate);
            }
        }

        // Nothing admissible: a full lap, leave the cursor where it was.
        self.cursor = start;
        None
    }
}

impl EventListener for RoundRobinPolicy {
    fn on_event(&mut self, _event: &DomainEvent) -> Result<(), BrokerError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "round-robin"
    }
}
