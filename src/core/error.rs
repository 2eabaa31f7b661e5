//! Error types for broker operations.

use thiserror::Error;

use crate::util::serde::{DatacenterId, WorkId, WorkerId};

/// Errors produced by broker components.
///
/// "No worker available" is deliberately absent: policies report it as
/// `Option::None` and the engine postpones the work.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Priority weights were requested for zero workers.
    #[error("empty worker set")]
    EmptyWorkerSet,
    /// Every value of one hardware dimension is zero, so its GCD is undefined.
    #[error("gcd undefined: every {0} value is zero")]
    UndefinedGcd(&'static str),
    /// Worker id is not tracked by this broker.
    #[error("unknown worker: {0}")]
    UnknownWorker(WorkerId),
    /// Datacenter id is not managed by this broker.
    #[error("unknown datacenter: {0}")]
    UnknownDatacenter(DatacenterId),
    /// Work item is not in the submitted set.
    #[error("unknown work item: {0}")]
    UnknownWork(WorkId),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An event listener failed while handling an event.
    #[error("listener `{listener}` failed: {reason}")]
    Listener {
        /// Listener name.
        listener: String,
        /// Failure description.
        reason: String,
    },
    /// The simulation gateway could not accept an outbound call.
    #[error("gateway error: {0}")]
    Gateway(String),
    /// The broker actor is no longer running.
    #[error("broker actor closed")]
    ActorClosed,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
