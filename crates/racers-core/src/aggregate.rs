//! Aggregate root abstraction.

use crate::event::DomainEvent;
use crate::id::Id;

/// Ordered buffer of events recorded by an aggregate but not yet persisted.
///
/// Aggregates keep their queue in a private field, so only their own
/// mutation methods can record into it.
#[derive(Debug, Clone)]
pub struct EventQueue<E> {
    events: Vec<E>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventQueue<E> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the end of the queue.
    pub fn record(&mut self, event: E) {
        self.events.push(event);
    }

    /// Returns the pending events without draining them.
    #[must_use]
    pub fn pending(&self) -> &[E] {
        &self.events
    }

    /// Takes every pending event, leaving the queue empty.
    pub fn consume(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Trait for aggregate roots that accumulate domain events between saves.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Id;

    /// Returns uncommitted events produced by mutations since the last save.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Returns uncommitted events and clears them. A second call before any
    /// new mutation returns an empty vector.
    fn consume_events(&mut self) -> Vec<Self::Event>;
}
