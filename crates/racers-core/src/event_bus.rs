//! Event bus abstraction for publishing committed domain events.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use crate::context::RequestContext;
use crate::error::InfrastructureError;
use crate::event::EventEnvelope;
use crate::unit_of_work::stage_or_apply;

/// Publishes domain events.
///
/// Callers publish from inside the same unit of work as the `save` that
/// produced the events, so a failed publish rolls the save back and an
/// uncommitted save never leaves a published event behind. Ordering and
/// delivery beyond that belong to the transport.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes `events` in order.
    async fn publish(
        &self,
        ctx: &RequestContext,
        events: Vec<EventEnvelope>,
    ) -> Result<(), InfrastructureError>;
}

/// Event bus keeping an in-process log of published events.
///
/// Inside a staged unit of work the events only reach the log on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventBus {
    log: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryEventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event published so far.
    #[must_use]
    pub fn published(&self) -> Vec<EventEnvelope> {
        self.log.read().clone()
    }

    /// Published events with the given type.
    #[must_use]
    pub fn published_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.log
            .read()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(
        &self,
        ctx: &RequestContext,
        events: Vec<EventEnvelope>,
    ) -> Result<(), InfrastructureError> {
        ctx.ensure_active()?;
        if events.is_empty() {
            return Ok(());
        }

        let log = Arc::clone(&self.log);
        stage_or_apply(ctx, move || {
            for event in &events {
                info!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    aggregate_id = %event.aggregate_id,
                    correlation_id = %event.correlation_id,
                    "event published"
                );
            }
            log.write().extend(events);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::id::Id;
    use crate::unit_of_work::{StagedUnitOfWork, UnitOfWork, work};

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope {
            event_id: Id::generate(),
            aggregate_id: Id::generate(),
            event_type: event_type.to_owned(),
            payload: serde_json::json!({}),
            correlation_id: Id::generate(),
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_outside_unit_of_work_is_immediate() {
        let bus = InMemoryEventBus::new();

        bus.publish(&RequestContext::new(), vec![envelope("a"), envelope("b")])
            .await
            .unwrap();

        assert_eq!(bus.published().len(), 2);
        assert_eq!(bus.published_of_type("b").len(), 1);
    }

    #[tokio::test]
    async fn test_publish_inside_failed_unit_of_work_is_discarded() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let uow = StagedUnitOfWork::new();
        let publisher = bus.clone();

        // Act
        let result = uow
            .run(
                &RequestContext::new(),
                work(move |ctx| async move {
                    publisher.publish(&ctx, vec![envelope("a")]).await?;
                    Err::<(), _>(InfrastructureError::Infrastructure("later step failed".into()))
                }),
            )
            .await;

        // Assert
        assert!(result.is_err());
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn test_publish_on_cancelled_context_fails() {
        let bus = InMemoryEventBus::new();
        let ctx = RequestContext::new();
        ctx.cancellation_token().cancel();

        let result = bus.publish(&ctx, vec![envelope("a")]).await;

        assert!(matches!(result, Err(InfrastructureError::Cancelled)));
        assert!(bus.published().is_empty());
    }
}
