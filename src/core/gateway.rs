//! Outbound seam towards the simulation engine.

use serde::{Deserialize, Serialize};

use crate::core::error::BrokerError;
use crate::core::work::{WorkItem, Worker};
use crate::util::serde::DatacenterId;

/// Characteristics reported by a datacenter before provisioning starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterDescriptor {
    /// Human-readable datacenter name, used in logs.
    pub name: String,
    /// Number of physical hosts.
    pub host_count: u32,
}

impl DatacenterDescriptor {
    /// Create a descriptor.
    pub fn new(name: impl Into<String>, host_count: u32) -> Self {
        Self {
            name: name.into(),
            host_count,
        }
    }
}

/// Calls the broker makes into the simulation engine.
///
/// Both calls are fire-and-forget: the outcome arrives later as an inbound
/// notification. An `Err` means the request never left the broker.
pub trait SimulationGateway: Send {
    /// Ask a datacenter to provision a worker.
    fn request_worker_provisioning(
        &mut self,
        datacenter: DatacenterId,
        worker: &Worker,
    ) -> Result<(), BrokerError>;

    /// Hand a bound unit of work to the datacenter owning its worker.
    fn submit_work(&mut self, datacenter: DatacenterId, work: &WorkItem) -> Result<(), BrokerError>;
}
