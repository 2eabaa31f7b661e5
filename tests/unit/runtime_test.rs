//! Tests for the runtime surface

use prometheus_cloud_broker::builders::BrokerBuilder;
use prometheus_cloud_broker::config::BrokerConfig;
use prometheus_cloud_broker::core::{BrokerError, DatacenterDescriptor, PolicyKind, Worker};
use prometheus_cloud_broker::infra::{ChannelGateway, InMemoryGateway, OutboundCall};
use prometheus_cloud_broker::runtime::{
    apply_notification, snapshot, spawn_broker, BrokerNotification,
};
use prometheus_cloud_broker::util::serde::{HardwareDescriptor, UtilizationProfile};

fn config() -> BrokerConfig {
    let workers = (0..2)
        .map(|id| Worker::new(id, HardwareDescriptor::new(1000, 1, 512)))
        .collect();
    BrokerConfig::new("tenant1", PolicyKind::RoundRobin, workers, vec![1]).with_initial_work(3, 1_000)
}

fn characteristics() -> BrokerNotification {
    BrokerNotification::Characteristics {
        datacenter: 1,
        descriptor: DatacenterDescriptor::new("dc-1", 2),
    }
}

#[test]
fn test_apply_notification_and_snapshot() {
    let mut engine = BrokerBuilder::new(config())
        .build(InMemoryGateway::new())
        .expect("valid config");

    apply_notification(&mut engine, characteristics()).expect("managed");
    for worker in 0..2 {
        apply_notification(
            &mut engine,
            BrokerNotification::WorkerProvisioned {
                datacenter: 1,
                worker,
                success: true,
            },
        )
        .expect("ack");
    }

    let snap = snapshot(&engine);
    assert_eq!(snap.tenant, "tenant1");
    assert_eq!(snap.pending, 1);
    assert_eq!(snap.in_flight, 2);
    assert_eq!(snap.available, 0);
    assert_eq!(snap.provisioned, vec![0, 1]);
    assert_eq!(snap.allocations.get(&0), Some(&1));

    let item = engine.submitted_item(0).cloned().expect("submitted");
    apply_notification(&mut engine, BrokerNotification::WorkReturned { item }).expect("known");
    apply_notification(
        &mut engine,
        BrokerNotification::SubmitWork {
            length: 50,
            utilization: UtilizationProfile::default(),
            worker: None,
        },
    )
    .expect("accepted");

    let snap = snapshot(&engine);
    assert_eq!(snap.returned, 1);
    assert_eq!(snap.in_flight, 2);
    assert_eq!(snap.pending, 1);
}

#[test]
fn test_notification_json_shape() {
    let json = r#"{"type":"worker_provisioned","datacenter":1,"worker":0,"success":false}"#;
    let parsed: BrokerNotification = serde_json::from_str(json).expect("valid notification");
    assert_eq!(
        parsed,
        BrokerNotification::WorkerProvisioned {
            datacenter: 1,
            worker: 0,
            success: false,
        }
    );

    let submit: BrokerNotification =
        serde_json::from_str(r#"{"type":"submit_work","length":10}"#).expect("defaults apply");
    assert!(matches!(
        submit,
        BrokerNotification::SubmitWork { length: 10, worker: None, .. }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_broker_actor_round_trip() {
    let (gateway, mut calls) = ChannelGateway::new();
    let engine = BrokerBuilder::new(config()).build(gateway).expect("valid config");
    let (handle, task) = spawn_broker(engine, 8);

    handle.notify(characteristics()).await.expect("managed");
    let mut provisioning = Vec::new();
    while provisioning.len() < 2 {
        if let Some(OutboundCall::ProvisionWorker { datacenter, worker }) = calls.recv().await {
            provisioning.push((datacenter, worker.id));
        }
    }
    assert_eq!(provisioning, vec![(1, 0), (1, 1)]);

    for (datacenter, worker) in provisioning {
        handle
            .notify(BrokerNotification::WorkerProvisioned {
                datacenter,
                worker,
                success: true,
            })
            .await
            .expect("ack");
    }

    let snap = handle.snapshot().await.expect("running");
    assert_eq!(snap.in_flight, 2);

    let unfinished = handle.teardown().await.expect("running");
    assert_eq!(unfinished.len(), 3);
    task.await.expect("actor exits cleanly");

    assert!(matches!(handle.snapshot().await, Err(BrokerError::ActorClosed)));
}
