//! Workers and units of work as seen by the broker.

use serde::{Deserialize, Serialize};

use crate::util::serde::{HardwareDescriptor, UtilizationProfile, WorkId, WorkerId};

/// An execution resource with fixed hardware capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Worker {
    /// Identifier, unique within a broker.
    pub id: WorkerId,
    /// Hardware capacity used for priority weighting.
    pub hardware: HardwareDescriptor,
}

impl Worker {
    /// Create a worker descriptor.
    #[must_use]
    pub const fn new(id: WorkerId, hardware: HardwareDescriptor) -> Self {
        Self { id, hardware }
    }
}

/// Submission state of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Waiting in the backlog for a worker.
    Pending,
    /// Handed to a worker's datacenter.
    Submitted,
    /// Reported complete by the simulation engine.
    Returned,
}

/// A unit of work (cloudlet) executed on exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Sequential identifier assigned by the broker.
    pub id: WorkId,
    /// Amount of computation.
    pub length: u64,
    /// Bound worker, `None` while unbound.
    pub worker: Option<WorkerId>,
    /// Opaque utilization descriptors.
    pub utilization: UtilizationProfile,
    /// Current submission state.
    pub status: WorkStatus,
}

impl WorkItem {
    /// Create a pending, unbound work item.
    #[must_use]
    pub const fn new(id: WorkId, length: u64, utilization: UtilizationProfile) -> Self {
        Self {
            id,
            length,
            worker: None,
            utilization,
            status: WorkStatus::Pending,
        }
    }

    /// Bind the item to a worker before submission.
    #[must_use]
    pub fn bound_to(mut self, worker: WorkerId) -> Self {
        self.worker = Some(worker);
        self
    }

    /// True when a worker binding is present.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.worker.is_some()
    }

    /// Synthesize the replacement for a finished item: same utilization,
    /// fixed length, no binding.
    #[must_use]
    pub const fn regenerate(&self, id: WorkId, length: u64) -> Self {
        Self::new(id, length, self.utilization)
    }
}
