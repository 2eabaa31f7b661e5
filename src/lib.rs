//! # Prometheus Cloud Broker
//!
//! A per-tenant broker for datacenter simulations with pluggable
//! load-balancing policies.
//!
//! A broker owns a backlog of units of work (cloudlets) and a fleet of
//! workers (virtual machines). It asks the simulation engine to provision the
//! workers, then binds each pending unit of work to a worker chosen by the
//! active policy and submits it to the datacenter hosting that worker.
//!
//! ## Core Pieces
//!
//! - **EventBus**: synchronous in-process publish/subscribe for domain events
//! - **WorkerStateTable**: per-worker availability and allocation counters
//! - **Policies**: round-robin, first-available, least-allocations and
//!   priority-weighted selection behind one [`core::LoadBalancingPolicy`] trait
//! - **DispatchEngine**: provisioning rounds, admission passes, work
//!   regeneration and teardown
//!
//! ## Flow
//!
//! ```text
//! simulation engine ──notification──► DispatchEngine ──► EventBus ──► policy / worker table / audit
//!        ▲                                  │
//!        └──────── SimulationGateway ◄──────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use prometheus_cloud_broker::builders::BrokerBuilder;
//! use prometheus_cloud_broker::config::BrokerConfig;
//! use prometheus_cloud_broker::core::{DatacenterDescriptor, PolicyKind, Worker};
//! use prometheus_cloud_broker::infra::InMemoryGateway;
//! use prometheus_cloud_broker::util::serde::HardwareDescriptor;
//!
//! let workers = (0..3)
//!     .map(|id| Worker::new(id, HardwareDescriptor::new(1000, 1, 512)))
//!     .collect();
//! let config = BrokerConfig::new("tenant-a", PolicyKind::RoundRobin, workers, vec![1])
//!     .with_initial_work(5, 10_000);
//!
//! let mut broker = BrokerBuilder::new(config).build(InMemoryGateway::new())?;
//! broker.on_characteristics(1, DatacenterDescriptor::new("dc-1", 4))?;
//! for worker in 0..3 {
//!     broker.on_worker_provisioned(1, worker, true)?;
//! }
//! assert_eq!(broker.in_flight(), 3);
//! ```
//!
//! For complete scenarios, see `tests/dispatch_engine_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Broker core: events, worker accounting, policies and the dispatch engine.
pub mod core;
/// Configuration models for brokers and tenant fleets.
pub mod config;
/// Builders to construct brokers from configuration.
pub mod builders;
/// Infrastructure adapters for the simulation gateway.
pub mod infra;
/// Notification routing and the async broker actor.
pub mod runtime;
/// Shared utilities.
pub mod util;
