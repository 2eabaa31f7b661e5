//! Simulation gateway backends.

#[cfg(feature = "tokio-runtime")]
pub mod channel;
pub mod memory;

use crate::core::{WorkItem, Worker};
use crate::util::serde::DatacenterId;

#[cfg(feature = "tokio-runtime")]
pub use channel::ChannelGateway;
pub use memory::InMemoryGateway;

/// Outbound call made by a broker, as recorded or forwarded by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCall {
    /// Provisioning request for a worker.
    ProvisionWorker {
        /// Target datacenter.
        datacenter: DatacenterId,
        /// Worker to provision.
        worker: Worker,
    },
    /// Bound work handed to a datacenter.
    SubmitWork {
        /// Target datacenter.
        datacenter: DatacenterId,
        /// Submitted item.
        work: WorkItem,
    },
}
