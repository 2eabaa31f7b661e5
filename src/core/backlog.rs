//! Observable backlog of pending work.

use crate::core::event::{DomainEvent, EventBus};
use crate::core::work::WorkItem;
use crate::util::serde::WorkId;

/// Pending units of work in submission order.
///
/// Additions and releases are published on the bus as
/// `BacklogContentAdded` / `BacklogContentRemoved`; clearing as
/// `BacklogContentChanged`. Detaching and reattaching publishes nothing.
pub struct Backlog {
    items: Vec<WorkItem>,
    bus: EventBus,
}

impl Backlog {
    /// Create an empty backlog publishing on `bus`.
    #[must_use]
    pub const fn new(bus: EventBus) -> Self {
        Self {
            items: Vec::new(),
            bus,
        }
    }

    /// Append an item.
    pub fn push(&mut self, item: WorkItem) {
        self.items.push(item.clone());
        self.bus.publish(&DomainEvent::BacklogContentAdded { item });
    }

    /// Look up an item.
    #[must_use]
    pub fn get(&self, id: WorkId) -> Option<&WorkItem> {
        self.items.iter().find(|w| w.id == id)
    }

    /// Remove every item.
    pub fn clear(&mut self) -> Vec<WorkItem> {
        let drained = std::mem::take(&mut self.items);
        self.bus.publish(&DomainEvent::BacklogContentChanged);
        drained
    }

    /// Take every item out for an admission pass. Nothing is published.
    ///
    /// Items that stay pending come back through [`Self::reattach`]; items
    /// that leave are announced through [`Self::release`].
    pub fn detach(&mut self) -> Vec<WorkItem> {
        std::mem::take(&mut self.items)
    }

    /// Put back the items kept by a pass, ahead of anything pushed since
    /// [`Self::detach`].
    pub fn reattach(&mut self, mut kept: Vec<WorkItem>) {
        kept.append(&mut self.items);
        self.items = kept;
    }

    /// Publish the departure of a detached item.
    pub fn release(&self, item: &WorkItem) {
        self.bus.publish(&DomainEvent::BacklogContentRemoved { item: item.clone() });
    }

    /// Items in order.
    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter()
    }

    /// Ids in order.
    #[must_use]
    pub fn ids(&self) -> Vec<WorkId> {
        self.items.iter().map(|w| w.id).collect()
    }

    /// Number of pending items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
