//! Pluggable load-balancing policies.
//!
//! A policy picks the worker for the next unbound unit of work. Exactly one
//! policy is active per broker; it reads and updates the broker's
//! [`WorkerTable`](crate::core::WorkerTable), injected at construction, and
//! may react to domain events through [`EventListener`].
//!
//! "No worker available" is `None`: the engine postpones the work item and
//! tries again on the next triggering event.

mod first_available;
mod least_allocations;
mod priority_weighted;
mod round_robin;

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub use first_available::FirstAvailablePolicy;
pub use least_allocations::LeastAllocationsPolicy;
pub use priority_weighted::PriorityWeightedPolicy;
pub use round_robin::RoundRobinPolicy;

use crate::core::event::{EventListener, SharedListener};
use crate::core::worker_table::{WorkerStateTable, WorkerTable};
use crate::util::serde::WorkerId;

/// Built-in policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Cycle through known workers.
    RoundRobin,
    /// First available worker in enumeration order (throttled).
    FirstAvailable,
    /// Worker with the fewest cumulative allocations.
    LeastAllocations,
    /// First available worker by descending hardware weight.
    PriorityWeighted,
}

/// Which candidates a policy may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission<'a> {
    /// Any known worker; availability-agnostic policies ignore state.
    Any,
    /// Only workers currently available. The engine always asks for this so
    /// that each worker holds a single outstanding unit of work.
    AvailableOnly,
    /// Available workers outside the given set. The engine switches to this
    /// for the rest of a pass once a worker's datacenter rejected work.
    AvailableExcept(&'a BTreeSet<WorkerId>),
}

impl Admission<'_> {
    /// True when `worker` may be returned under this admission.
    #[must_use]
    pub fn admits(self, table: &WorkerStateTable, worker: WorkerId) -> bool {
        match self {
            Self::Any => true,
            Self::AvailableOnly => table.is_available(worker),
            Self::AvailableExcept(excluded) => {
                table.is_available(worker) && !excluded.contains(&worker)
            }
        }
    }
}

/// Capability shared by every load-balancing policy.
pub trait LoadBalancingPolicy: EventListener + Send {
    /// Which policy this is.
    fn kind(&self) -> PolicyKind;

    /// Pick a worker allowed by `admission` and record one allocation for it.
    /// Returns `None`, with no side effect on allocations, when nothing
    /// qualifies.
    fn select_worker(&mut self, admission: Admission<'_>) -> Option<WorkerId>;

    /// Pick the next worker following the policy's own rule.
    fn next_worker(&mut self) -> Option<WorkerId> {
        self.select_worker(Admission::Any)
    }
}

/// Active policy shared between the engine and the event bus.
pub type SharedPolicy = Arc<Mutex<dyn LoadBalancingPolicy>>;

/// Wrap a policy so the engine can call it and the bus can deliver to it.
pub fn share_policy<P>(policy: P) -> (SharedPolicy, SharedListener)
where
    P: LoadBalancingPolicy + 'static,
{
    let shared = Arc::new(Mutex::new(policy));
    let as_policy: SharedPolicy = shared.clone();
    let as_listener: SharedListener = shared;
    (as_policy, as_listener)
}

/// Build one of the built-in policies over a broker's worker table.
#[must_use]
pub fn build_policy(kind: PolicyKind, table: WorkerTable) -> (SharedPolicy, SharedListener) {
    match kind {
        PolicyKind::RoundRobin => share_policy(RoundRobinPolicy::new(table)),
        PolicyKind::FirstAvailable => share_policy(FirstAvailablePolicy::new(table)),
        PolicyKind::LeastAllocations => share_policy(LeastAllocationsPolicy::new(table)),
        PolicyKind::PriorityWeighted => share_policy(PriorityWeightedPolicy::new(table)),
    }
}
