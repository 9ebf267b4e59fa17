//! Domain events for the Races context.

use racers_core::event::{DomainEvent, EventMetadata};
use racers_users::domain::values::UserId;
use serde::{Deserialize, Serialize};

use super::values::{RaceDate, RaceId, RaceName};

/// Event type name for `RaceCreated`.
pub const RACE_CREATED_EVENT_TYPE: &str = "races.race_created";
/// Event type name for `RaceCompetitorJoined`.
pub const RACE_COMPETITOR_JOINED_EVENT_TYPE: &str = "races.competitor_joined";

/// Emitted when a race is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceCreated {
    /// The race identifier.
    pub race_id: RaceId,
    /// The race name.
    pub name: RaceName,
    /// When the race takes place.
    pub date: RaceDate,
    /// The user who created the race.
    pub owner_id: UserId,
}

/// Emitted when a competitor joins a race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceCompetitorJoined {
    /// The race identifier.
    pub race_id: RaceId,
    /// The joining user.
    pub competitor_id: UserId,
}

/// Event payload variants for the Races context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceEventKind {
    /// A race has been created.
    RaceCreated(RaceCreated),
    /// A competitor has joined a race.
    RaceCompetitorJoined(RaceCompetitorJoined),
}

/// Domain event envelope for the Races context.
#[derive(Debug, Clone)]
pub struct RaceEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: RaceEventKind,
}

impl DomainEvent for RaceEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            RaceEventKind::RaceCreated(_) => RACE_CREATED_EVENT_TYPE,
            RaceEventKind::RaceCompetitorJoined(_) => RACE_COMPETITOR_JOINED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("RaceEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
