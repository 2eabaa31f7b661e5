//! Tests for error types

use prometheus_cloud_broker::core::{AppResult, BrokerError};

#[test]
fn test_empty_worker_set_error() {
    let err = BrokerError::EmptyWorkerSet;
    assert_eq!(format!("{}", err), "empty worker set");
}

#[test]
fn test_undefined_gcd_error() {
    let err = BrokerError::UndefinedGcd("ram");
    assert_eq!(format!("{}", err), "gcd undefined: every ram value is zero");
}

#[test]
fn test_unknown_ids_error() {
    assert_eq!(BrokerError::UnknownWorker(3).to_string(), "unknown worker: 3");
    assert_eq!(BrokerError::UnknownDatacenter(2).to_string(), "unknown datacenter: 2");
    assert_eq!(BrokerError::UnknownWork(9).to_string(), "unknown work item: 9");
}

#[test]
fn test_listener_error() {
    let err = BrokerError::Listener {
        listener: "audit".to_string(),
        reason: "sink full".to_string(),
    };
    assert_eq!(format!("{}", err), "listener `audit` failed: sink full");
}

#[test]
fn test_gateway_and_actor_errors() {
    assert_eq!(
        BrokerError::Gateway("datacenter 1 offline".into()).to_string(),
        "gateway error: datacenter 1 offline"
    );
    assert_eq!(BrokerError::ActorClosed.to_string(), "broker actor closed");
}

#[test]
fn test_app_result_wraps_broker_error() {
    fn fails() -> AppResult<()> {
        Err(BrokerError::InvalidConfig("tenant must not be empty".into()).into())
    }
    let err = fails().unwrap_err();
    assert_eq!(err.to_string(), "invalid configuration: tenant must not be empty");
}
