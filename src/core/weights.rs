//! Static priority weights derived from worker hardware.
//!
//! Each hardware dimension is normalised by the GCD of that dimension across
//! the worker set, and the three ratios are summed:
//!
//! ```text
//! weight = ram / gcd(ram) + pes / gcd(pes) + mips / gcd(mips)
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::core::error::BrokerError;
use crate::core::work::Worker;
use crate::util::serde::WorkerId;

/// Euclidean GCD. `gcd(0, x) == x`, so zero operands are absorbed.
#[must_use]
pub const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

fn gcd_of(values: impl Iterator<Item = u64>, dimension: &'static str) -> Result<u64, BrokerError> {
    match values.fold(0, gcd) {
        0 => Err(BrokerError::UndefinedGcd(dimension)),
        g => Ok(g),
    }
}

/// Per-dimension GCDs across a worker set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceGcd {
    /// GCD of processing rates.
    pub mips: u64,
    /// GCD of core counts.
    pub pes: u64,
    /// GCD of memory sizes.
    pub ram: u64,
}

impl ResourceGcd {
    /// Compute the three GCDs independently.
    pub fn of(workers: &[Worker]) -> Result<Self, BrokerError> {
        if workers.is_empty() {
            return Err(BrokerError::EmptyWorkerSet);
        }
        Ok(Self {
            mips: gcd_of(workers.iter().map(|w| w.hardware.mips), "mips")?,
            pes: gcd_of(workers.iter().map(|w| w.hardware.pes), "pes")?,
            ram: gcd_of(workers.iter().map(|w| w.hardware.ram), "ram")?,
        })
    }

    /// Weight of one worker under these divisors, saturating at `u64::MAX`.
    #[must_use]
    pub const fn weight(&self, worker: &Worker) -> u64 {
        (worker.hardware.ram / self.ram)
            .saturating_add(worker.hardware.pes / self.pes)
            .saturating_add(worker.hardware.mips / self.mips)
    }
}

/// Weight per worker id, fixed once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityWeightTable {
    gcd: ResourceGcd,
    weights: BTreeMap<WorkerId, u64>,
}

impl PriorityWeightTable {
    /// Compute weights for a non-empty worker set.
    pub fn compute(workers: &[Worker]) -> Result<Self, BrokerError> {
        let gcd = ResourceGcd::of(workers)?;
        let weights = workers.iter().map(|w| (w.id, gcd.weight(w))).collect();
        tracing::debug!(
            "priority gcd ram={} pes={} mips={}",
            gcd.ram,
            gcd.pes,
            gcd.mips
        );
        Ok(Self { gcd, weights })
    }

    /// Weight of a worker, `None` if it was not part of the computation.
    #[must_use]
    pub fn weight(&self, worker: WorkerId) -> Option<u64> {
        self.weights.get(&worker).copied()
    }

    /// All weights by worker id.
    #[must_use]
    pub const fn weights(&self) -> &BTreeMap<WorkerId, u64> {
        &self.weights
    }

    /// Divisors used for normalisation.
    #[must_use]
    pub const fn gcd(&self) -> ResourceGcd {
        self.gcd
    }

    /// Worker ids by descending weight, ties by ascending id.
    #[must_use]
    pub fn ordering(&self) -> Vec<WorkerId> {
        let ids: Vec<WorkerId> = self.weights.keys().copied().collect();
        order_by_weight(&ids, &self.weights)
    }
}

/// Compute the weight of every worker.
pub fn compute_weights(workers: &[Worker]) -> Result<BTreeMap<WorkerId, u64>, BrokerError> {
    PriorityWeightTable::compute(workers).map(|t| t.weights)
}

/// Order ids by descending weight. Ids without a weight sort last; ties are
/// broken by ascending id.
#[must_use]
pub fn order_by_weight(ids: &[WorkerId], weights: &BTreeMap<WorkerId, u64>) -> Vec<WorkerId> {
    let mut ordered = ids.to_vec();
    ordered.sort_by(|a, b| {
        let by_weight = match (weights.get(a), weights.get(b)) {
            (Some(wa), Some(wb)) => wb.cmp(wa),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_weight.then_with(|| a.cmp(b))
    });
    ordered
}
