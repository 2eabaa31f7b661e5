//! Tests for gateway backends

use prometheus_cloud_broker::core::{SimulationGateway, WorkItem, Worker};
use prometheus_cloud_broker::infra::{ChannelGateway, InMemoryGateway, OutboundCall};
use prometheus_cloud_broker::util::serde::{HardwareDescriptor, UtilizationProfile};

#[test]
fn test_in_memory_gateway_records_in_order() {
    let mut gateway = InMemoryGateway::new();
    let worker = Worker::new(3, HardwareDescriptor::new(1000, 1, 512));
    let item = WorkItem::new(0, 100, UtilizationProfile::default()).bound_to(3);

    gateway.request_worker_provisioning(1, &worker).expect("online");
    gateway.submit_work(1, &item).expect("online");

    assert_eq!(
        gateway.calls(),
        &[
            OutboundCall::ProvisionWorker { datacenter: 1, worker },
            OutboundCall::SubmitWork { datacenter: 1, work: item },
        ]
    );
}

#[tokio::test]
async fn test_channel_gateway_forwards_calls() {
    let (mut gateway, mut rx) = ChannelGateway::new();
    let worker = Worker::new(1, HardwareDescriptor::new(1000, 1, 512));

    gateway.request_worker_provisioning(2, &worker).expect("receiver alive");
    let call = rx.recv().await.expect("forwarded call");
    assert_eq!(call, OutboundCall::ProvisionWorker { datacenter: 2, worker });

    drop(rx);
    let item = WorkItem::new(0, 100, UtilizationProfile::default());
    assert!(gateway.submit_work(2, &item).is_err());
}
