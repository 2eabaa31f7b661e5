//! Tests for utility functions

use prometheus_cloud_broker::util::{
    init_tracing, now_ms, HardwareDescriptor, UtilizationModel, UtilizationProfile,
};

#[test]
fn test_hardware_positive() {
    assert!(HardwareDescriptor::new(1000, 1, 512).is_positive());
    assert!(!HardwareDescriptor::new(1000, 0, 512).is_positive());
    assert!(!HardwareDescriptor::new(0, 1, 512).is_positive());
}

#[test]
fn test_utilization_defaults() {
    let profile = UtilizationProfile::default();
    assert_eq!(profile.pes, 1);
    assert_eq!(profile.file_size, 300);
    assert_eq!(profile.output_size, 300);
    assert_eq!(profile.cpu, UtilizationModel::Full);
}

#[test]
fn test_utilization_serde() {
    let json = r#"{"pes":2,"file_size":10,"output_size":20,"cpu":"stochastic","ram":"full","bw":"full"}"#;
    let profile: UtilizationProfile = serde_json::from_str(json).expect("valid profile");
    assert_eq!(profile.pes, 2);
    assert_eq!(profile.cpu, UtilizationModel::Stochastic);
}

#[test]
fn test_now_ms_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(b >= a);
    assert!(a > 0);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
