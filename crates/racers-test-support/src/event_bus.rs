//! Test event buses: `EventBus` doubles for failure and call inspection.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_core::event::EventEnvelope;
use racers_core::event_bus::EventBus;

/// An event bus that always fails. Useful for proving that a failed publish
/// rolls back the save made in the same unit of work.
#[derive(Debug)]
pub struct FailingEventBus;

#[async_trait]
impl EventBus for FailingEventBus {
    async fn publish(
        &self,
        _ctx: &RequestContext,
        _events: Vec<EventEnvelope>,
    ) -> Result<(), InfrastructureError> {
        Err(InfrastructureError::Infrastructure("broker unavailable".into()))
    }
}

/// An event bus that cancels the request while publishing, simulating a
/// client that disconnects mid-transaction.
#[derive(Debug)]
pub struct CancellingEventBus;

#[async_trait]
impl EventBus for CancellingEventBus {
    async fn publish(
        &self,
        ctx: &RequestContext,
        _events: Vec<EventEnvelope>,
    ) -> Result<(), InfrastructureError> {
        ctx.cancellation_token().cancel();
        Err(InfrastructureError::Cancelled)
    }
}

/// One observed `publish` call.
#[derive(Debug, Clone)]
pub struct PublishCall {
    /// Whether the call carried a transaction.
    pub in_transaction: bool,
    /// The published events.
    pub events: Vec<EventEnvelope>,
}

/// An event bus that records every call immediately, whether or not the
/// surrounding unit of work commits.
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    calls: Mutex<Vec<PublishCall>>,
}

impl RecordingEventBus {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded calls.
    pub fn calls(&self) -> Vec<PublishCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish(
        &self,
        ctx: &RequestContext,
        events: Vec<EventEnvelope>,
    ) -> Result<(), InfrastructureError> {
        self.calls.lock().push(PublishCall {
            in_transaction: ctx.in_transaction(),
            events,
        });
        Ok(())
    }
}

/// An event bus that yields to the scheduler before delegating to `inner`.
///
/// Publishing happens inside the unit of work, after the service has read
/// and checked state but before it commits, so two operations driven with
/// `tokio::join!` both finish their reads before either commits.
#[derive(Clone)]
pub struct YieldingEventBus {
    inner: Arc<dyn EventBus>,
}

impl YieldingEventBus {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn EventBus>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl EventBus for YieldingEventBus {
    async fn publish(
        &self,
        ctx: &RequestContext,
        events: Vec<EventEnvelope>,
    ) -> Result<(), InfrastructureError> {
        tokio::task::yield_now().await;
        self.inner.publish(ctx, events).await
    }
}
