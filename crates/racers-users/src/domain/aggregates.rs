//! Aggregate root for users.

use racers_core::aggregate::{AggregateRoot, EventQueue};
use racers_core::clock::Clock;
use racers_core::event::EventMetadata;
use racers_core::id::Id;

use super::events::{USER_CREATED_EVENT_TYPE, UserCreated, UserEvent, UserEventKind};
use super::values::{UserId, UserName};

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    name: UserName,
    events: EventQueue<UserEvent>,
}

impl User {
    /// Rebuilds a user from stored state. Records no event.
    #[must_use]
    pub fn new(id: UserId, name: UserName) -> Self {
        Self {
            id,
            name,
            events: EventQueue::new(),
        }
    }

    /// Registers a new user, producing a `UserCreated` event.
    #[must_use]
    pub fn create(id: UserId, name: UserName, correlation_id: Id, clock: &dyn Clock) -> Self {
        let mut user = Self::new(id, name);
        let event = UserEvent {
            metadata: EventMetadata::record(
                USER_CREATED_EVENT_TYPE,
                id.as_id(),
                correlation_id,
                clock.now(),
            ),
            kind: UserEventKind::UserCreated(UserCreated {
                user_id: id,
                name: user.name.as_str().to_owned(),
            }),
        };
        user.events.record(event);
        user
    }

    /// The user identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// The user's name.
    #[must_use]
    pub fn name(&self) -> &UserName {
        &self.name
    }
}

impl AggregateRoot for User {
    type Event = UserEvent;

    fn aggregate_id(&self) -> Id {
        self.id.as_id()
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        self.events.pending()
    }

    fn consume_events(&mut self) -> Vec<Self::Event> {
        self.events.consume()
    }
}
