//! Domain events for the Users context.

use racers_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};

use super::values::UserId;

/// Event type name for `UserCreated`.
pub const USER_CREATED_EVENT_TYPE: &str = "users.user_created";

/// Emitted when a user is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreated {
    /// The user identifier.
    pub user_id: UserId,
    /// The user's name.
    pub name: String,
}

/// Event payload variants for the Users context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserEventKind {
    /// A user has been created.
    UserCreated(UserCreated),
}

/// Domain event envelope for the Users context.
#[derive(Debug, Clone)]
pub struct UserEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: UserEventKind,
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            UserEventKind::UserCreated(_) => USER_CREATED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("UserEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
