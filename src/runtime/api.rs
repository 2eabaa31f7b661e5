//! Inbound notification surface and broker snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{
    BrokerError, DatacenterDescriptor, DispatchEngine, PolicyKind, SimulationGateway, WorkItem,
};
use crate::util::serde::{DatacenterId, UtilizationProfile, WorkerId};

/// Notification delivered to a broker by the simulation engine or a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrokerNotification {
    /// A datacenter reported its characteristics.
    Characteristics {
        /// Reporting datacenter.
        datacenter: DatacenterId,
        /// Reported characteristics.
        descriptor: DatacenterDescriptor,
    },
    /// Outcome of a provisioning request.
    WorkerProvisioned {
        /// Datacenter that handled the request.
        datacenter: DatacenterId,
        /// Worker concerned.
        worker: WorkerId,
        /// True when the worker now exists.
        success: bool,
    },
    /// A unit of work completed.
    WorkReturned {
        /// The finished item.
        item: WorkItem,
    },
    /// Tenant submission of a new unit of work.
    SubmitWork {
        /// Amount of computation.
        length: u64,
        /// Utilization descriptors.
        #[serde(default)]
        utilization: UtilizationProfile,
        /// Optional pre-binding.
        #[serde(default)]
        worker: Option<WorkerId>,
    },
}

/// Point-in-time view of a broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerSnapshot {
    /// Tenant name.
    pub tenant: String,
    /// Active policy.
    pub policy: PolicyKind,
    /// Pending work items.
    pub pending: usize,
    /// Submitted, not yet returned work items.
    pub in_flight: usize,
    /// Work items returned so far.
    pub returned: u64,
    /// Provisioned workers in provisioning order.
    pub provisioned: Vec<WorkerId>,
    /// Workers currently available.
    pub available: usize,
    /// Allocation count per worker.
    pub allocations: BTreeMap<WorkerId, u64>,
}

/// Route a notification to the matching engine handler.
///
/// Tenant submissions are dispatched immediately once the broker has started
/// placing work; before that they wait in the backlog.
pub fn apply_notification<G: SimulationGateway>(
    engine: &mut DispatchEngine<G>,
    notification: BrokerNotification,
) -> Result<(), BrokerError> {
    match notification {
        BrokerNotification::Characteristics {
            datacenter,
            descriptor,
        } => engine.on_characteristics(datacenter, descriptor),
        BrokerNotification::WorkerProvisioned {
            datacenter,
            worker,
            success,
        } => engine.on_worker_provisioned(datacenter, worker, success),
        BrokerNotification::WorkReturned { item } => engine.on_work_returned(item),
        BrokerNotification::SubmitWork {
            length,
            utilization,
            worker,
        } => {
            engine.add_work(length, utilization, worker);
            if engine.is_dispatching() {
                engine.dispatch();
            }
            Ok(())
        }
    }
}

/// Capture a snapshot of a broker.
#[must_use]
pub fn snapshot<G>(engine: &DispatchEngine<G>) -> BrokerSnapshot {
    let handle = engine.worker_table();
    let table = handle.lock();
    BrokerSnapshot {
        tenant: engine.tenant().to_owned(),
        policy: engine.policy_kind(),
        pending: engine.backlog().len(),
        in_flight: engine.in_flight(),
        returned: engine.returned_count(),
        provisioned: engine.provisioned_workers().iter().map(|w| w.id).collect(),
        available: table.available_count(),
        allocations: table.allocations().clone(),
    }
}
