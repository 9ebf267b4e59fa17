//! Shared test doubles and utilities for the racers service.

mod clock;
mod event_bus;

pub use clock::{FixedClock, tomorrow, yesterday};
pub use event_bus::{
    CancellingEventBus, FailingEventBus, PublishCall, RecordingEventBus, YieldingEventBus,
};
