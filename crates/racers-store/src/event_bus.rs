//! Event bus that records envelopes in the `events` table.

use async_trait::async_trait;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_core::event::EventEnvelope;
use racers_core::event_bus::EventBus;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::connection::{Connection, database};

/// Publishes events by inserting them into the `events` table. Inside a unit
/// of work the insert shares the aggregate's transaction, so an event is
/// stored exactly when its state change commits.
#[derive(Debug, Clone)]
pub struct PgEventBus {
    pool: PgPool,
}

impl PgEventBus {
    /// Creates a bus over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventBus for PgEventBus {
    #[instrument(skip(self, ctx, events), fields(events_len = events.len()))]
    async fn publish(
        &self,
        ctx: &RequestContext,
        events: Vec<EventEnvelope>,
    ) -> Result<(), InfrastructureError> {
        if events.is_empty() {
            return Ok(());
        }
        for event in &events {
            info!(
                event_id = %event.event_id,
                event_type = %event.event_type,
                aggregate_id = %event.aggregate_id,
                "publishing event"
            );
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO events (event_id, aggregate_id, event_type, payload, correlation_id, occurred_at) ",
        );
        qb.push_values(events, |mut b, event| {
            b.push_bind(event.event_id.as_uuid());
            b.push_bind(event.aggregate_id.as_uuid());
            b.push_bind(event.event_type);
            b.push_bind(event.payload);
            b.push_bind(event.correlation_id.as_uuid());
            b.push_bind(event.occurred_at);
        });

        let mut conn = Connection::acquire(ctx, &self.pool).await?;
        let conn = conn.get()?;
        ctx.guard(async {
            qb.build()
                .execute(&mut *conn)
                .await
                .map_err(database("inserting events"))
        })
        .await?;
        Ok(())
    }
}
