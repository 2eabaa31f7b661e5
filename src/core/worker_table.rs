//! Worker availability and allocation bookkeeping.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::error::BrokerError;
use crate::core::event::{DomainEvent, EventListener};
use crate::util::serde::WorkerId;

/// Availability of a provisioned worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Ready to receive a unit of work.
    Available,
    /// Executing its single outstanding unit of work.
    Busy,
}

/// Per-worker availability flags and cumulative allocation counters.
///
/// Workers enumerate in ascending id order; every policy relies on that as its
/// stable enumeration. An id absent from the state map is "not provisioned",
/// never available.
#[derive(Debug, Clone, Default)]
pub struct WorkerStateTable {
    states: BTreeMap<WorkerId, WorkerState>,
    allocations: BTreeMap<WorkerId, u64>,
}

/// Handle to the table owned by one broker and injected into its policies.
pub type WorkerTable = Arc<Mutex<WorkerStateTable>>;

/// Create an empty shared table.
#[must_use]
pub fn shared_table() -> WorkerTable {
    Arc::new(Mutex::new(WorkerStateTable::new()))
}

impl WorkerStateTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state of a worker, tracking it if it was unknown.
    pub fn set_state(&mut self, worker: WorkerId, state: WorkerState) {
        self.states.insert(worker, state);
    }

    /// State of a worker, `None` if it is not provisioned.
    #[must_use]
    pub fn state(&self, worker: WorkerId) -> Option<WorkerState> {
        self.states.get(&worker).copied()
    }

    /// State of a worker that must already be tracked.
    pub fn require_state(&self, worker: WorkerId) -> Result<WorkerState, BrokerError> {
        self.state(worker).ok_or(BrokerError::UnknownWorker(worker))
    }

    /// True when the worker is tracked and available.
    #[must_use]
    pub fn is_available(&self, worker: WorkerId) -> bool {
        self.state(worker) == Some(WorkerState::Available)
    }

    /// Record one allocation and return the new count.
    pub fn mark_allocated(&mut self, worker: WorkerId) -> u64 {
        let count = self.allocations.entry(worker).or_insert(0);
        *count += 1;
        *count
    }

    /// Withdraw one allocation that did not end in a binding. A counter that
    /// drops to zero is removed, so the worker reads as never allocated.
    pub fn release_allocation(&mut self, worker: WorkerId) {
        if let Some(count) = self.allocations.get_mut(&worker) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.allocations.remove(&worker);
            }
        }
    }

    /// Allocations recorded for a worker, zero if none.
    #[must_use]
    pub fn allocation_count(&self, worker: WorkerId) -> u64 {
        self.allocations.get(&worker).copied().unwrap_or(0)
    }

    /// True once the worker has been allocated at least once.
    #[must_use]
    pub fn has_allocation(&self, worker: WorkerId) -> bool {
        self.allocations.contains_key(&worker)
    }

    /// Tracked workers in ascending id order.
    pub fn known_workers(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.states.keys().copied()
    }

    /// Number of available workers.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == WorkerState::Available)
            .count()
    }

    /// Number of tracked workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True when no worker is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// All tracked states.
    #[must_use]
    pub const fn states(&self) -> &BTreeMap<WorkerId, WorkerState> {
        &self.states
    }

    /// All allocation counters.
    #[must_use]
    pub const fn allocations(&self) -> &BTreeMap<WorkerId, u64> {
        &self.allocations
    }

    /// Forget every worker state. Allocation history is kept.
    pub fn clear_states(&mut self) {
        self.states.clear();
    }
}

/// Applies the two post-provisioning transitions shared by every policy:
/// bound work makes a worker busy, finished work makes it available again.
pub struct WorkerStateListener {
    table: WorkerTable,
}

impl WorkerStateListener {
    /// Create a listener mutating the given table.
    #[must_use]
    pub const fn new(table: WorkerTable) -> Self {
        Self { table }
    }
}

impl EventListener for WorkerStateListener {
    fn on_event(&mut self, event: &DomainEvent) -> Result<(), BrokerError> {
        let next = match event {
            DomainEvent::WorkBoundToWorker { .. } => WorkerState::Busy,
            DomainEvent::WorkerFinishedWork { .. } => WorkerState::Available,
            _ => return Ok(()),
        };
        let Some(worker) = event.worker() else {
            return Ok(());
        };

        let mut table = self.table.lock();
        table.require_state(worker)?;
        table.set_state(worker, next);
        tracing::debug!("worker #{} is now {:?}", worker, next);
        Ok(())
    }

    fn name(&self) -> &str {
        "worker-state"
    }
}
