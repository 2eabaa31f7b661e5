//! Tests for configuration validation

use prometheus_cloud_broker::config::{BrokerConfig, FleetConfig};
use prometheus_cloud_broker::core::{PolicyKind, Worker};
use prometheus_cloud_broker::util::serde::HardwareDescriptor;

fn workers(count: u32) -> Vec<Worker> {
    (0..count)
        .map(|id| Worker::new(id, HardwareDescriptor::new(1000, 1, 512)))
        .collect()
}

#[test]
fn test_broker_config_validation() {
    let valid = BrokerConfig::new("tenant1", PolicyKind::RoundRobin, workers(3), vec![1, 2]);
    assert!(valid.validate().is_ok());
    assert_eq!(valid.expected_worker_count(), 3);
    assert_eq!(valid.max_provisioning_rounds, 3);
}

#[test]
fn test_broker_config_invalid_tenant() {
    let invalid = BrokerConfig::new("  ", PolicyKind::RoundRobin, workers(1), vec![1]);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_broker_config_invalid_workers() {
    let empty = BrokerConfig::new("tenant1", PolicyKind::RoundRobin, vec![], vec![1]);
    assert!(empty.validate().is_err());

    let mut duplicated = workers(2);
    duplicated[1].id = 0;
    let duplicate = BrokerConfig::new("tenant1", PolicyKind::RoundRobin, duplicated, vec![1]);
    assert!(duplicate.validate().is_err());

    let zero = vec![Worker::new(0, HardwareDescriptor::new(1000, 1, 0))];
    let zero_ram = BrokerConfig::new("tenant1", PolicyKind::PriorityWeighted, zero, vec![1]);
    assert!(zero_ram.validate().is_err());
}

#[test]
fn test_broker_config_invalid_counts() {
    let base = BrokerConfig::new("tenant1", PolicyKind::RoundRobin, workers(2), vec![1]);
    assert!(base.clone().with_expected_workers(3).validate().is_err());
    assert!(base.clone().with_expected_workers(0).validate().is_err());
    assert!(base.clone().with_max_provisioning_rounds(0).validate().is_err());
    assert!(base.clone().with_regeneration(0).validate().is_err());
    assert!(base.clone().with_initial_work(2, 0).validate().is_err());
    assert!(base.with_initial_work(2, 100).with_regeneration(50).validate().is_ok());
}

#[test]
fn test_broker_config_invalid_datacenters() {
    let none = BrokerConfig::new("tenant1", PolicyKind::RoundRobin, workers(1), vec![]);
    assert!(none.validate().is_err());
    let repeated = BrokerConfig::new("tenant1", PolicyKind::RoundRobin, workers(1), vec![2, 2]);
    assert!(repeated.validate().is_err());
}

#[test]
fn test_broker_config_from_json() {
    let json = r#"{
        "tenant": "tenant1",
        "policy": "least_allocations",
        "workers": [
            {"id": 0, "hardware": {"mips": 1000, "pes": 1, "ram": 512}},
            {"id": 1, "hardware": {"mips": 2000, "pes": 2, "ram": 1024}}
        ],
        "datacenters": [1, 2],
        "initial_work_count": 4,
        "work_length": 10000,
        "regeneration_length": 2500
    }"#;

    let cfg = BrokerConfig::from_json_str(json).expect("valid config");
    assert_eq!(cfg.policy, PolicyKind::LeastAllocations);
    assert_eq!(cfg.workers.len(), 2);
    assert_eq!(cfg.regeneration_length, Some(2500));
    assert_eq!(cfg.max_provisioning_rounds, 3);
    assert_eq!(cfg.utilization.pes, 1);
}

#[test]
fn test_broker_config_from_json_errors() {
    assert!(BrokerConfig::from_json_str("not json")
        .unwrap_err()
        .starts_with("parse error"));
    let invalid = r#"{"tenant":"t","policy":"round_robin","workers":[],"datacenters":[1],"work_length":1}"#;
    assert!(BrokerConfig::from_json_str(invalid).is_err());
}

#[test]
fn test_fleet_config_validation() {
    let mut fleet = FleetConfig {
        brokers: std::collections::HashMap::new(),
    };
    assert!(fleet.validate().is_err());

    fleet.brokers.insert(
        "tenant1".to_string(),
        BrokerConfig::new("tenant1", PolicyKind::RoundRobin, workers(1), vec![1]),
    );
    assert!(fleet.validate().is_ok());

    fleet.brokers.insert(
        "tenant2".to_string(),
        BrokerConfig::new("tenant2", PolicyKind::RoundRobin, vec![], vec![1]),
    );
    let err = fleet.validate().unwrap_err();
    assert!(err.contains("tenant2"));
}
