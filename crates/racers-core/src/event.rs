//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::Id;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Id,
    /// Type name for routing on the bus.
    pub event_type: String,
    /// Aggregate that produced the event.
    pub aggregate_id: Id,
    /// Correlation ID of the request that caused the event.
    pub correlation_id: Id,
    /// Timestamp assigned when the event was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Builds metadata for an event recorded now by `aggregate_id`.
    #[must_use]
    pub fn record(
        event_type: &str,
        aggregate_id: Id,
        correlation_id: Id,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Id::generate(),
            event_type: event_type.to_owned(),
            aggregate_id,
            correlation_id,
            occurred_at,
        }
    }
}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for bus routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Converts the event into the envelope handed to the event bus.
    fn to_envelope(&self) -> EventEnvelope {
        let meta = self.metadata();
        EventEnvelope {
            event_id: meta.event_id,
            aggregate_id: meta.aggregate_id,
            event_type: self.event_type().to_owned(),
            payload: self.to_payload(),
            correlation_id: meta.correlation_id,
            occurred_at: meta.occurred_at,
        }
    }
}

/// Transport representation of a committed domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event identifier.
    pub event_id: Id,
    /// Aggregate this event belongs to.
    pub aggregate_id: Id,
    /// Event type name.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Correlation ID for tracing.
    pub correlation_id: Id,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}
