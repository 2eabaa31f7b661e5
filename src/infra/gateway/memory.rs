//! In-memory gateway recording every outbound call.

use std::collections::BTreeSet;

use crate::core::{BrokerError, SimulationGateway, WorkItem, Worker};
use crate::infra::gateway::OutboundCall;
use crate::util::serde::{DatacenterId, WorkerId};

/// Gateway that records calls instead of forwarding them. Datacenters marked
/// offline reject every call.
#[derive(Debug, Default, Clone)]
pub struct InMemoryGateway {
    calls: Vec<OutboundCall>,
    offline: BTreeSet<DatacenterId>,
}

impl InMemoryGateway {
    /// Create a gateway with every datacenter online.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a datacenter offline from the start.
    #[must_use]
    pub fn with_offline(mut self, datacenter: DatacenterId) -> Self {
        self.offline.insert(datacenter);
        self
    }

    /// Toggle a datacenter's availability.
    pub fn set_offline(&mut self, datacenter: DatacenterId, offline: bool) {
        if offline {
            self.offline.insert(datacenter);
        } else {
            self.offline.remove(&datacenter);
        }
    }

    /// Every recorded call, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[OutboundCall] {
        &self.calls
    }

    /// Drain the recorded calls.
    pub fn take_calls(&mut self) -> Vec<OutboundCall> {
        std::mem::take(&mut self.calls)
    }

    /// Provisioning requests as `(datacenter, worker)` pairs.
    #[must_use]
    pub fn provision_requests(&self) -> Vec<(DatacenterId, WorkerId)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                OutboundCall::ProvisionWorker { datacenter, worker } => Some((*datacenter, worker.id)),
                OutboundCall::SubmitWork { .. } => None,
            })
            .collect()
    }

    /// Submitted work as `(datacenter, item)` pairs.
    #[must_use]
    pub fn submissions(&self) -> Vec<(DatacenterId, &WorkItem)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                OutboundCall::SubmitWork { datacenter, work } => Some((*datacenter, work)),
                OutboundCall::ProvisionWorker { .. } => None,
            })
            .collect()
    }

    fn check_online(&self, datacenter: DatacenterId) -> Result<(), BrokerError> {
        if self.offline.contains(&datacenter) {
            return Err(BrokerError::Gateway(format!("datacenter {datacenter} offline")));
        }
        Ok(())
    }
}

impl SimulationGateway for InMemoryGateway {
    fn request_worker_provisioning(
        &mut self,
        datacenter: DatacenterId,
        worker: &Worker,
    ) -> Result<(), BrokerError> {
        self.check_online(datacenter)?;
        self.calls.push(OutboundCall::ProvisionWorker {
            datacenter,
            worker: *worker,
        });
        Ok(())
    }

    fn submit_work(&mut self, datacenter: DatacenterId, work: &WorkItem) -> Result<(), BrokerError> {
        self.check_online(datacenter)?;
        self.calls.push(OutboundCall::SubmitWork {
            datacenter,
            work: work.clone(),
        });
        Ok(())
    }
}
