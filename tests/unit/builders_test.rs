//! Tests for builder modules

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use prometheus_cloud_broker::builders::{build_brokers, BrokerBuilder};
use prometheus_cloud_broker::config::{BrokerConfig, FleetConfig};
use prometheus_cloud_broker::core::{
    AuditListener, BrokerError, EventKind, InMemoryAuditSink, LeastAllocationsPolicy, PolicyKind,
    Worker,
};
use prometheus_cloud_broker::infra::InMemoryGateway;
use prometheus_cloud_broker::util::serde::HardwareDescriptor;

fn config(tenant: &str, policy: PolicyKind) -> BrokerConfig {
    let workers = (0..2)
        .map(|id| Worker::new(id, HardwareDescriptor::new(1000, 1, 512)))
        .collect();
    BrokerConfig::new(tenant, policy, workers, vec![1]).with_initial_work(3, 1_000)
}

#[test]
fn test_broker_builder_defaults() {
    let engine = BrokerBuilder::new(config("tenant1", PolicyKind::RoundRobin))
        .build(InMemoryGateway::new())
        .expect("valid config");

    assert_eq!(engine.tenant(), "tenant1");
    assert_eq!(engine.policy_kind(), PolicyKind::RoundRobin);
    assert_eq!(engine.backlog().len(), 3);
    assert_eq!(engine.backlog().ids(), vec![0, 1, 2]);
    assert_eq!(engine.bus().len(), 2);
}

#[test]
fn test_broker_builder_custom_policy() {
    let engine = BrokerBuilder::new(config("tenant1", PolicyKind::RoundRobin))
        .with_policy(LeastAllocationsPolicy::new)
        .build(InMemoryGateway::new())
        .expect("valid config");
    assert_eq!(engine.policy_kind(), PolicyKind::LeastAllocations);
}

#[test]
fn test_broker_builder_listeners_see_initial_work() {
    let audit = Arc::new(Mutex::new(AuditListener::new("tenant1", InMemoryAuditSink::new(16))));
    let engine = BrokerBuilder::new(config("tenant1", PolicyKind::FirstAvailable))
        .with_listener(audit.clone())
        .with_audit_sink(InMemoryAuditSink::new(4))
        .build(InMemoryGateway::new())
        .expect("valid config");

    assert_eq!(engine.bus().len(), 4);
    let actions: Vec<_> = audit.lock().sink().events().iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![EventKind::BacklogContentAdded; 3]);
}

#[test]
fn test_broker_builder_rejects_invalid_config() {
    let invalid = BrokerConfig::new("tenant1", PolicyKind::RoundRobin, vec![], vec![1]);
    let result = BrokerBuilder::new(invalid).build(InMemoryGateway::new());
    assert!(matches!(result, Err(BrokerError::InvalidConfig(_))));
}

#[test]
fn test_build_brokers_per_tenant() {
    let mut brokers = HashMap::new();
    brokers.insert("a".to_string(), config("a", PolicyKind::RoundRobin));
    brokers.insert("b".to_string(), config("b", PolicyKind::PriorityWeighted));
    let fleet = FleetConfig { brokers };

    let mut seen = Vec::new();
    let built = build_brokers(&fleet, |name, _| {
        seen.push(name.to_string());
        Ok(InMemoryGateway::new())
    })
    .expect("valid fleet");

    seen.sort();
    assert_eq!(seen, vec!["a", "b"]);
    assert_eq!(built.len(), 2);
    assert_eq!(built["b"].policy_kind(), PolicyKind::PriorityWeighted);
}

#[test]
fn test_build_brokers_gateway_failure() {
    let mut brokers = HashMap::new();
    brokers.insert("a".to_string(), config("a", PolicyKind::RoundRobin));
    let fleet = FleetConfig { brokers };

    let result = build_brokers::<InMemoryGateway, _>(&fleet, |_, _| {
        Err(BrokerError::Gateway("no route".into()))
    });
    assert!(matches!(result, Err(BrokerError::Gateway(_))));
}
