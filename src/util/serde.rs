//! Serializable identifiers and value types shared across the broker.

use serde::{Deserialize, Serialize};

/// Worker (virtual machine) identifier, unique within one broker.
pub type WorkerId = u32;

/// Unit-of-work (cloudlet) identifier, assigned sequentially by the broker.
pub type WorkId = u64;

/// Datacenter identifier issued by the simulation engine.
pub type DatacenterId = u32;

/// Fixed hardware capacity of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HardwareDescriptor {
    /// Processing rate in MIPS.
    pub mips: u64,
    /// Number of processing elements (cores).
    pub pes: u64,
    /// Memory size in MB.
    pub ram: u64,
}

impl HardwareDescriptor {
    /// Build a descriptor from processing rate, core count and memory.
    #[must_use]
    pub const fn new(mips: u64, pes: u64, ram: u64) -> Self {
        Self { mips, pes, ram }
    }

    /// True when every dimension is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.mips > 0 && self.pes > 0 && self.ram > 0
    }
}

/// How a unit of work consumes one resource over time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationModel {
    /// Uses the full capacity for its whole length.
    #[default]
    Full,
    /// Draws a random utilization at each step.
    Stochastic,
}

/// Resource-utilization descriptors carried by a unit of work.
///
/// The broker never interprets these; they are handed to the simulation engine
/// unchanged and copied onto regenerated work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtilizationProfile {
    /// Processing elements requested by the work item.
    pub pes: u32,
    /// Input file size in bytes.
    pub file_size: u64,
    /// Output file size in bytes.
    pub output_size: u64,
    /// CPU utilization model.
    pub cpu: UtilizationModel,
    /// Memory utilization model.
    pub ram: UtilizationModel,
    /// Bandwidth utilization model.
    pub bw: UtilizationModel,
}

impl Default for UtilizationProfile {
    fn default() -> Self {
        Self {
            pes: 1,
            file_size: 300,
            output_size: 300,
            cpu: UtilizationModel::Full,
            ram: UtilizationModel::Full,
            bw: UtilizationModel::Full,
        }
    }
}
