//! Dispatch engine: the per-tenant broker.
//!
//! The engine is driven entirely by inbound notifications from the simulation
//! engine. Each notification is handled synchronously:
//!
//! ```text
//! on_characteristics ──► provisioning round ──► gateway.request_worker_provisioning
//! on_worker_provisioned ─► worker table ─► AllWorkersProvisioned ─► dispatch
//! on_work_returned ─► WorkerFinishedWork ─► regenerate ─► dispatch
//! dispatch ─► policy.select_worker ─► gateway.submit_work ─► WorkBoundToWorker
//! ```
//!
//! Work that cannot be placed is simply left pending and reconsidered on the
//! next notification; there is no waiting and no error for the tenant.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::BrokerConfig;
use crate::core::backlog::Backlog;
use crate::core::error::BrokerError;
use crate::core::event::{DomainEvent, EventBus, SharedListener};
use crate::core::gateway::{DatacenterDescriptor, SimulationGateway};
use crate::core::policy::{build_policy, Admission, LoadBalancingPolicy, PolicyKind, SharedPolicy};
use crate::core::work::{WorkItem, WorkStatus, Worker};
use crate::core::worker_table::{shared_table, WorkerState, WorkerStateListener, WorkerTable};
use crate::util::serde::{DatacenterId, UtilizationProfile, WorkId, WorkerId};

/// Result of one admission pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Items handed to the gateway during the pass.
    pub submitted: usize,
    /// Items left pending.
    pub postponed: usize,
}

/// What became of one item handed to the gateway.
enum Placement {
    Sent,
    /// The worker is not provisioned or not available.
    Postponed(WorkItem),
    /// The gateway refused the submission.
    Rejected(WorkItem),
}

/// Broker for one tenant: owns the backlog, drives worker provisioning and
/// binds work to workers through the active policy.
pub struct DispatchEngine<G> {
    tenant: String,
    gateway: G,
    bus: EventBus,
    table: WorkerTable,
    policy: SharedPolicy,
    policy_kind: PolicyKind,

    workers: Vec<Worker>,
    expected_workers: usize,
    datacenters: Vec<DatacenterId>,
    characteristics: BTreeMap<DatacenterId, DatacenterDescriptor>,
    worker_datacenters: BTreeMap<WorkerId, DatacenterId>,
    provisioned: Vec<Worker>,
    requested: usize,
    acks: usize,
    provisioning_round: u32,
    max_provisioning_rounds: u32,
    dispatching: bool,

    backlog: Backlog,
    submitted: BTreeMap<WorkId, WorkItem>,
    returned_count: u64,
    next_work_id: WorkId,
    regeneration_length: Option<u64>,
}

impl<G: SimulationGateway> DispatchEngine<G> {
    /// Create an engine running the configured built-in policy.
    pub fn new(config: &BrokerConfig, gateway: G) -> Result<Self, BrokerError> {
        Self::with_policy(config, gateway, |table| build_policy(config.policy, table))
    }

    /// Create an engine whose policy is built by `factory` over the engine's
    /// worker table.
    ///
    /// Subscription order on the bus is: worker-state transitions, then the
    /// policy. Further listeners can be added through [`Self::bus`].
    pub fn with_policy<F>(config: &BrokerConfig, gateway: G, factory: F) -> Result<Self, BrokerError>
    where
        F: FnOnce(WorkerTable) -> (SharedPolicy, SharedListener),
    {
        config.validate().map_err(BrokerError::InvalidConfig)?;

        let bus = EventBus::new();
        let table = shared_table();
        bus.subscribe(Arc::new(Mutex::new(WorkerStateListener::new(Arc::clone(&table)))));
        let (policy, listener) = factory(Arc::clone(&table));
        bus.subscribe(listener);
        let policy_kind = policy.lock().kind();

        let mut engine = Self {
            tenant: config.tenant.clone(),
            gateway,
            backlog: Backlog::new(bus.clone()),
            bus,
            table,
            policy,
            policy_kind,
            workers: config.workers.clone(),
            expected_workers: config.expected_worker_count(),
            datacenters: config.datacenters.clone(),
            characteristics: BTreeMap::new(),
            worker_datacenters: BTreeMap::new(),
            provisioned: Vec::new(),
            requested: 0,
            acks: 0,
            provisioning_round: 0,
            max_provisioning_rounds: config.max_provisioning_rounds,
            dispatching: false,
            submitted: BTreeMap::new(),
            returned_count: 0,
            next_work_id: 0,
            regeneration_length: config.regeneration_length,
        };

        for _ in 0..config.initial_work_count {
            engine.add_work(config.work_length, config.utilization, None);
        }

        tracing::info!(
            "{}: broker ready with {:?} policy, {} workers, {} pending work items",
            engine.tenant,
            engine.policy_kind,
            engine.workers.len(),
            engine.backlog.len()
        );
        Ok(engine)
    }

    /// Append a unit of work to the backlog, optionally pre-bound to a worker.
    pub fn add_work(
        &mut self,
        length: u64,
        utilization: UtilizationProfile,
        worker: Option<WorkerId>,
    ) -> WorkId {
        let mut item = WorkItem::new(self.next_id(), length, utilization);
        item.worker = worker;
        let id = item.id;
        self.backlog.push(item);
        id
    }

    /// Record a datacenter's characteristics. Once every managed datacenter
    /// has reported, the first provisioning round is issued.
    pub fn on_characteristics(
        &mut self,
        datacenter: DatacenterId,
        descriptor: DatacenterDescriptor,
    ) -> Result<(), BrokerError> {
        if !self.datacenters.contains(&datacenter) {
            tracing::warn!("{}: characteristics from unmanaged datacenter {}", self.tenant, datacenter);
            return Err(BrokerError::UnknownDatacenter(datacenter));
        }
        tracing::debug!("{}: characteristics of {} received", self.tenant, descriptor.name);
        self.characteristics.insert(datacenter, descriptor);

        if self.characteristics.len() == self.datacenters.len() && self.provisioning_round == 0 {
            self.request_provisioning();
        }
        Ok(())
    }

    /// Handle the outcome of a provisioning request.
    ///
    /// The engine always completes its own bookkeeping. A listener failure
    /// while delivering `AllWorkersProvisioned`, such as
    /// [`BrokerError::EmptyWorkerSet`] from the priority policy, is returned
    /// afterwards.
    pub fn on_worker_provisioned(
        &mut self,
        datacenter: DatacenterId,
        worker: WorkerId,
        success: bool,
    ) -> Result<(), BrokerError> {
        let mut outcome = Ok(());
        let mut newly_provisioned = false;

        if success {
            let known = self.workers.iter().find(|w| w.id == worker).copied();
            match known {
                None => {
                    tracing::warn!("{}: provisioning ack for unknown worker #{}", self.tenant, worker);
                    outcome = Err(BrokerError::UnknownWorker(worker));
                }
                Some(_) if self.worker_datacenters.contains_key(&worker) => {
                    tracing::debug!("{}: worker #{} already provisioned", self.tenant, worker);
                }
                Some(descriptor) => {
                    self.worker_datacenters.insert(worker, datacenter);
                    self.table.lock().set_state(worker, WorkerState::Available);
                    self.provisioned.push(descriptor);
                    newly_provisioned = true;
                    tracing::info!(
                        "{}: worker #{} has been created in {}",
                        self.tenant,
                        worker,
                        self.datacenter_name(datacenter)
                    );

                    if self.provisioned.len() == self.expected_workers {
                        let report = self.bus.publish(&DomainEvent::AllWorkersProvisioned {
                            workers: self.provisioned.clone(),
                        });
                        if let Some(error) = report.into_first_error() {
                            outcome = Err(error);
                        }
                    }
                }
            }
        } else {
            tracing::warn!(
                "{}: creation of worker #{} failed in {}",
                self.tenant,
                worker,
                self.datacenter_name(datacenter)
            );
        }

        self.acks += 1;

        if self.dispatching {
            if newly_provisioned {
                self.dispatch();
            }
        } else if self.worker_datacenters.len() == self.workers.len() {
            self.begin_dispatch();
        } else if self.acks >= self.requested {
            if self.provisioning_round < self.max_provisioning_rounds {
                self.request_provisioning();
            } else {
                tracing::warn!(
                    "{}: provisioning gave up after {} rounds with {} of {} workers",
                    self.tenant,
                    self.provisioning_round,
                    self.worker_datacenters.len(),
                    self.workers.len()
                );
                self.begin_dispatch();
            }
        }

        outcome
    }

    /// Handle a unit of work reported complete by the simulation engine.
    ///
    /// Returns [`BrokerError::UnknownWork`] without touching any state if the
    /// item is not outstanding.
    pub fn on_work_returned(&mut self, item: WorkItem) -> Result<(), BrokerError> {
        let Some(submitted) = self.submitted.remove(&item.id) else {
            tracing::warn!("{}: return of unknown work item #{}", self.tenant, item.id);
            return Err(BrokerError::UnknownWork(item.id));
        };

        let mut finished = item;
        finished.worker = submitted.worker;
        finished.status = WorkStatus::Returned;
        self.returned_count += 1;
        tracing::debug!("{}: work item #{} received", self.tenant, finished.id);

        if let Some(worker) = finished.worker {
            self.bus.publish(&DomainEvent::WorkerFinishedWork {
                worker,
                work: finished.id,
            });
        }

        if let Some(length) = self.regeneration_length {
            let replacement = finished.regenerate(self.next_id(), length);
            tracing::debug!(
                "{}: regenerated work item #{} from #{}",
                self.tenant,
                replacement.id,
                finished.id
            );
            self.backlog.push(replacement);
        }

        self.dispatch();
        Ok(())
    }

    /// Admission pass over the pending backlog.
    ///
    /// Unbound items are offered to the policy, restricted to available
    /// workers. Bound items go to their worker's datacenter once that worker
    /// is provisioned and available. Everything else stays pending.
    ///
    /// A policy-chosen item the gateway rejects goes back unbound with its
    /// allocation withdrawn, and the worker is not offered again in this pass.
    pub fn dispatch(&mut self) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let mut policy_exhausted = false;
        let mut excluded = BTreeSet::new();

        let pending = self.backlog.detach();
        let mut kept = Vec::with_capacity(pending.len());

        for mut item in pending {
            let from_policy = !item.is_bound();
            if from_policy {
                if policy_exhausted {
                    outcome.postponed += 1;
                    kept.push(item);
                    continue;
                }
                let admission = if excluded.is_empty() {
                    Admission::AvailableOnly
                } else {
                    Admission::AvailableExcept(&excluded)
                };
                let selected = self.policy.lock().select_worker(admission);
                if selected.is_none() {
                    tracing::debug!(
                        "{}: postponing work item #{}: no worker available",
                        self.tenant,
                        item.id
                    );
                    policy_exhausted = true;
                    outcome.postponed += 1;
                    kept.push(item);
                    continue;
                }
                item.worker = selected;
            }

            match self.submit(item, from_policy) {
                Placement::Sent => outcome.submitted += 1,
                Placement::Postponed(mut item) | Placement::Rejected(mut item) if from_policy => {
                    if let Some(worker) = item.worker.take() {
                        self.table.lock().release_allocation(worker);
                        excluded.insert(worker);
                    }
                    outcome.postponed += 1;
                    kept.push(item);
                }
                Placement::Postponed(item) => {
                    outcome.postponed += 1;
                    kept.push(item);
                }
                Placement::Rejected(item) => {
                    excluded.extend(item.worker);
                    outcome.postponed += 1;
                    kept.push(item);
                }
            }
        }

        self.backlog.reattach(kept);

        if outcome.submitted > 0 {
            tracing::debug!(
                "{}: dispatch submitted {}, postponed {}",
                self.tenant,
                outcome.submitted,
                outcome.postponed
            );
        }
        outcome
    }

    /// Stop tracking workers and return every unfinished work item.
    pub fn teardown(&mut self) -> Vec<WorkItem> {
        let mut unfinished = self.backlog.clear();
        unfinished.extend(std::mem::take(&mut self.submitted).into_values());
        self.table.lock().clear_states();
        self.worker_datacenters.clear();
        self.provisioned.clear();
        self.dispatching = false;
        tracing::info!(
            "{}: torn down with {} unfinished work items",
            self.tenant,
            unfinished.len()
        );
        unfinished
    }

    fn request_provisioning(&mut self) {
        let round = self.provisioning_round as usize;
        let count = self.datacenters.len();
        let mut requested = 0;

        for (index, worker) in self.workers.iter().enumerate() {
            if self.worker_datacenters.contains_key(&worker.id) {
                continue;
            }
            let datacenter = self.datacenters[(index + round) % count];
            tracing::info!(
                "{}: trying to create worker #{} in {}",
                self.tenant,
                worker.id,
                self.datacenter_name(datacenter)
            );
            match self.gateway.request_worker_provisioning(datacenter, worker) {
                Ok(()) => requested += 1,
                Err(error) => tracing::warn!(
                    "{}: provisioning request for worker #{} not sent: {}",
                    self.tenant,
                    worker.id,
                    error
                ),
            }
        }

        self.requested = requested;
        self.acks = 0;
        self.provisioning_round += 1;

        if requested == 0 {
            tracing::warn!("{}: no provisioning request could be sent", self.tenant);
            self.begin_dispatch();
        }
    }

    fn begin_dispatch(&mut self) {
        self.dispatching = true;
        tracing::info!(
            "{}: {} of {} workers provisioned, dispatching",
            self.tenant,
            self.worker_datacenters.len(),
            self.workers.len()
        );
        self.dispatch();
    }

    fn submit(&mut self, mut item: WorkItem, counted: bool) -> Placement {
        let Some(worker) = item.worker else {
            return Placement::Postponed(item);
        };
        let Some(datacenter) = self.worker_datacenters.get(&worker).copied() else {
            tracing::debug!(
                "{}: postponing work item #{}: worker #{} not provisioned",
                self.tenant,
                item.id,
                worker
            );
            return Placement::Postponed(item);
        };
        if !self.table.lock().is_available(worker) {
            tracing::debug!(
                "{}: postponing work item #{}: worker #{} busy",
                self.tenant,
                item.id,
                worker
            );
            return Placement::Postponed(item);
        }

        item.status = WorkStatus::Submitted;
        if let Err(error) = self.gateway.submit_work(datacenter, &item) {
            tracing::warn!(
                "{}: sending work item #{} to worker #{} failed: {}",
                self.tenant,
                item.id,
                worker,
                error
            );
            item.status = WorkStatus::Pending;
            return Placement::Rejected(item);
        }

        // Tenant-bound items were never counted by the policy.
        if !counted {
            self.table.lock().mark_allocated(worker);
        }
        let id = item.id;
        self.backlog.release(&item);
        self.submitted.insert(id, item);
        tracing::debug!("{}: sent work item #{} to worker #{}", self.tenant, id, worker);
        self.bus.publish(&DomainEvent::WorkBoundToWorker { worker, work: id });
        Placement::Sent
    }

    fn next_id(&mut self) -> WorkId {
        let id = self.next_work_id;
        self.next_work_id += 1;
        id
    }

    fn datacenter_name(&self, datacenter: DatacenterId) -> String {
        self.characteristics
            .get(&datacenter)
            .map_or_else(|| format!("datacenter #{datacenter}"), |d| d.name.clone())
    }
}

impl<G> DispatchEngine<G> {
    /// Tenant name.
    #[must_use]
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Active policy kind.
    #[must_use]
    pub const fn policy_kind(&self) -> PolicyKind {
        self.policy_kind
    }

    /// Handle to the active policy.
    #[must_use]
    pub fn policy(&self) -> SharedPolicy {
        Arc::clone(&self.policy)
    }

    /// Event bus carrying this broker's domain events.
    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Handle to the worker table.
    #[must_use]
    pub fn worker_table(&self) -> WorkerTable {
        Arc::clone(&self.table)
    }

    /// Current state of a worker, `None` if not provisioned.
    #[must_use]
    pub fn worker_state(&self, worker: WorkerId) -> Option<WorkerState> {
        self.table.lock().state(worker)
    }

    /// Allocations recorded for a worker.
    #[must_use]
    pub fn allocation_count(&self, worker: WorkerId) -> u64 {
        self.table.lock().allocation_count(worker)
    }

    /// Datacenter hosting a provisioned worker.
    #[must_use]
    pub fn datacenter_of(&self, worker: WorkerId) -> Option<DatacenterId> {
        self.worker_datacenters.get(&worker).copied()
    }

    /// Provisioned workers in provisioning order.
    #[must_use]
    pub fn provisioned_workers(&self) -> &[Worker] {
        &self.provisioned
    }

    /// Provisioning rounds issued so far.
    #[must_use]
    pub const fn provisioning_round(&self) -> u32 {
        self.provisioning_round
    }

    /// True once the engine has started placing work.
    #[must_use]
    pub const fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    /// Pending work.
    #[must_use]
    pub const fn backlog(&self) -> &Backlog {
        &self.backlog
    }

    /// Outstanding submitted work item by id.
    #[must_use]
    pub fn submitted_item(&self, id: WorkId) -> Option<&WorkItem> {
        self.submitted.get(&id)
    }

    /// Outstanding submitted work in id order.
    pub fn submitted_items(&self) -> impl Iterator<Item = &WorkItem> {
        self.submitted.values()
    }

    /// Number of submitted, not yet returned items.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.submitted.len()
    }

    /// Pending plus in-flight items.
    #[must_use]
    pub fn backlog_len(&self) -> usize {
        self.backlog.len() + self.submitted.len()
    }

    /// Items returned so far.
    #[must_use]
    pub const fn returned_count(&self) -> u64 {
        self.returned_count
    }

    /// The outbound gateway.
    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }
}
