//! Tests for audit sink

use std::sync::Arc;

use parking_lot::Mutex;
use prometheus_cloud_broker::core::{
    build_audit_event, AuditListener, AuditSink, DomainEvent, EventBus, EventKind,
    InMemoryAuditSink, TracingAuditSink, WorkItem,
};
use prometheus_cloud_broker::util::serde::UtilizationProfile;

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        "tenant1",
        &DomainEvent::WorkBoundToWorker { worker: 2, work: 7 },
    );

    sink.record(event);
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].tenant, "tenant1");
    assert_eq!(events[0].action, EventKind::WorkBoundToWorker);
    assert_eq!(events[0].work_id, Some(7));
    assert_eq!(events[0].worker_id, Some(2));
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    for work in 1..=3 {
        sink.record(build_audit_event(
            "tenant1",
            &DomainEvent::WorkerFinishedWork { worker: 0, work },
        ));
    }

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].work_id, Some(2)); // First one popped
    assert_eq!(events[1].work_id, Some(3));
}

#[test]
fn test_zero_capacity_sink_drops_everything() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event("tenant1", &DomainEvent::BacklogContentChanged));
    assert!(sink.events().is_empty());
}

#[test]
fn test_build_audit_event() {
    let item = WorkItem::new(4, 1500, UtilizationProfile::default());
    let added = build_audit_event("tenant1", &DomainEvent::BacklogContentAdded { item });
    let other = build_audit_event("tenant1", &DomainEvent::BacklogContentChanged);

    assert_eq!(added.action, EventKind::BacklogContentAdded);
    assert_eq!(added.work_id, Some(4));
    assert_eq!(added.worker_id, None);
    assert_eq!(added.detail.as_deref(), Some("length 1500"));
    assert!(added.created_at_ms > 0);
    assert_ne!(added.event_id, other.event_id);
    let parsed = uuid::Uuid::parse_str(&added.event_id).ok();
    assert_eq!(parsed.map(|u| u.get_version_num()), Some(4));
}

#[test]
fn test_audit_listener_on_bus() {
    let bus = EventBus::new();
    let listener = Arc::new(Mutex::new(AuditListener::new("tenant1", InMemoryAuditSink::new(8))));
    bus.subscribe(listener.clone());
    bus.subscribe(Arc::new(Mutex::new(AuditListener::new("tenant1", TracingAuditSink))));

    let report = bus.publish(&DomainEvent::AllWorkersProvisioned { workers: vec![] });
    assert_eq!(report.delivered, 2);

    let events = listener.lock().sink().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, EventKind::AllWorkersProvisioned);
    assert_eq!(events[0].detail.as_deref(), Some("0 workers provisioned"));
}
