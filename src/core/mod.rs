//! Broker core: domain events, worker accounting, policies and the dispatch
//! engine.

pub mod audit;
pub mod backlog;
pub mod broker;
pub mod error;
pub mod event;
pub mod gateway;
pub mod policy;
pub mod weights;
pub mod work;
pub mod worker_table;

pub use audit::{
    build_audit_event, AuditEvent, AuditListener, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use backlog::Backlog;
pub use broker::{DispatchEngine, DispatchOutcome};
pub use error::{AppResult, BrokerError};
pub use event::{
    DeliveryReport, DomainEvent, EventBus, EventKind, EventListener, FnListener, ListenerFailure,
    ListenerId, SharedListener,
};
pub use gateway::{DatacenterDescriptor, SimulationGateway};
pub use policy::{
    build_policy, share_policy, Admission, FirstAvailablePolicy, LeastAllocationsPolicy,
    LoadBalancingPolicy, PolicyKind, PriorityWeightedPolicy, RoundRobinPolicy, SharedPolicy,
};
pub use weights::{compute_weights, gcd, order_by_weight, PriorityWeightTable, ResourceGcd};
pub use work::{WorkItem, WorkStatus, Worker};
pub use worker_table::{
    shared_table, WorkerState, WorkerStateListener, WorkerStateTable, WorkerTable,
};
