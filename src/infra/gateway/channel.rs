//! Gateway forwarding outbound calls over a tokio channel.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::core::{BrokerError, SimulationGateway, WorkItem, Worker};
use crate::infra::gateway::OutboundCall;
use crate::util::serde::DatacenterId;

/// Gateway handing every call to an async simulation driver.
#[derive(Debug, Clone)]
pub struct ChannelGateway {
    tx: UnboundedSender<OutboundCall>,
}

impl ChannelGateway {
    /// Create a gateway and the receiver the simulation driver reads from.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<OutboundCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, call: OutboundCall) -> Result<(), BrokerError> {
        self.tx
            .send(call)
            .map_err(|_| BrokerError::Gateway("simulation driver gone".into()))
    }
}

impl SimulationGateway for ChannelGateway {
    fn request_worker_provisioning(
        &mut self,
        datacenter: DatacenterId,
        worker: &Worker,
    ) -> Result<(), BrokerError> {
        self.send(OutboundCall::ProvisionWorker {
            datacenter,
            worker: *worker,
        })
    }

    fn submit_work(&mut self, datacenter: DatacenterId, work: &WorkItem) -> Result<(), BrokerError> {
        self.send(OutboundCall::SubmitWork {
            datacenter,
            work: work.clone(),
        })
    }
}
