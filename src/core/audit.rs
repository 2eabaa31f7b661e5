//! Audit sink implementations.
//!
//! [`AuditListener`] subscribes to the event bus and turns every domain event
//! into an [`AuditEvent`] for a pluggable [`AuditSink`].

use std::collections::VecDeque;

use crate::core::error::BrokerError;
use crate::core::event::{DomainEvent, EventKind, EventListener};
use crate::util::clock::now_ms;
use crate::util::serde::{WorkId, WorkerId};

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Tenant owning the broker.
    pub tenant: String,
    /// Domain event kind.
    pub action: EventKind,
    /// Related work item, if any.
    pub work_id: Option<WorkId>,
    /// Related worker, if any.
    pub worker_id: Option<WorkerId>,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Sink that writes each audit event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&mut self, event: AuditEvent) {
        tracing::info!(
            event_id = %event.event_id,
            tenant = %event.tenant,
            action = ?event.action,
            work_id = ?event.work_id,
            worker_id = ?event.worker_id,
            "audit"
        );
    }
}

/// Helper to build an audit event from a domain event.
pub fn build_audit_event(tenant: impl Into<String>, event: &DomainEvent) -> AuditEvent {
    let detail = match event {
        DomainEvent::AllWorkersProvisioned { workers } => {
            Some(format!("{} workers provisioned", workers.len()))
        }
        DomainEvent::BacklogContentAdded { item } | DomainEvent::BacklogContentRemoved { item } => {
            Some(format!("length {}", item.length))
        }
        _ => None,
    };
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        tenant: tenant.into(),
        action: event.kind(),
        work_id: event.work(),
        worker_id: event.worker(),
        created_at_ms: now_ms(),
        detail,
    }
}

/// Event listener feeding an audit sink.
pub struct AuditListener<S> {
    tenant: String,
    sink: S,
}

impl<S: AuditSink> AuditListener<S> {
    /// Audit events of `tenant` into `sink`.
    pub fn new(tenant: impl Into<String>, sink: S) -> Self {
        Self {
            tenant: tenant.into(),
            sink,
        }
    }

    /// Underlying sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: AuditSink> EventListener for AuditListener<S> {
    fn on_event(&mut self, event: &DomainEvent) -> Result<(), BrokerError> {
        self.sink.record(build_audit_event(self.tenant.as_str(), event));
        Ok(())
    }

    fn name(&self) -> &str {
        "audit"
    }
}
