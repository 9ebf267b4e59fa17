//! Aggregate root for races.

use std::collections::BTreeSet;

use racers_core::aggregate::{AggregateRoot, EventQueue};
use racers_core::clock::Clock;
use racers_core::event::EventMetadata;
use racers_core::id::Id;
use racers_users::domain::aggregates::User;
use racers_users::domain::values::UserId;

use super::errors::CompetitorInRaceError;
use super::events::{
    RACE_COMPETITOR_JOINED_EVENT_TYPE, RACE_CREATED_EVENT_TYPE, RaceCompetitorJoined, RaceCreated,
    RaceEvent, RaceEventKind,
};
use super::values::{RaceDate, RaceId, RaceName};

/// Optional state applied when building a race.
#[derive(Debug, Clone, Default)]
pub struct RaceOptions {
    /// Competitors already registered.
    pub competitors: BTreeSet<UserId>,
}

/// A race and its competitor roster.
#[derive(Debug, Clone)]
pub struct Race {
    id: RaceId,
    name: RaceName,
    date: RaceDate,
    owner: UserId,
    competitors: BTreeSet<UserId>,
    events: EventQueue<RaceEvent>,
}

impl Race {
    /// Rebuilds a race from stored state. Records no event.
    #[must_use]
    pub fn new(
        id: RaceId,
        name: RaceName,
        date: RaceDate,
        owner: UserId,
        options: RaceOptions,
    ) -> Self {
        Self {
            id,
            name,
            date,
            owner,
            competitors: options.competitors,
            events: EventQueue::new(),
        }
    }

    /// Creates a new race, producing a `RaceCreated` event.
    #[must_use]
    pub fn create(
        id: RaceId,
        name: RaceName,
        date: RaceDate,
        owner: UserId,
        correlation_id: Id,
        clock: &dyn Clock,
    ) -> Self {
        let mut race = Self::new(id, name, date, owner, RaceOptions::default());
        let event = RaceEvent {
            metadata: EventMetadata::record(
                RACE_CREATED_EVENT_TYPE,
                id.as_id(),
                correlation_id,
                clock.now(),
            ),
            kind: RaceEventKind::RaceCreated(RaceCreated {
                race_id: id,
                name: race.name.clone(),
                date,
                owner_id: owner,
            }),
        };
        race.events.record(event);
        race
    }

    /// Adds `user` to the competitors, producing a `RaceCompetitorJoined`
    /// event.
    ///
    /// # Errors
    ///
    /// Returns `CompetitorInRaceError` if the user already competes. No event
    /// is recorded in that case.
    pub fn join(
        &mut self,
        user: &User,
        correlation_id: Id,
        clock: &dyn Clock,
    ) -> Result<(), CompetitorInRaceError> {
        let competitor_id = user.id();
        if !self.competitors.insert(competitor_id) {
            return Err(CompetitorInRaceError {
                race_id: self.id,
                competitor_id,
            });
        }

        self.events.record(RaceEvent {
            metadata: EventMetadata::record(
                RACE_COMPETITOR_JOINED_EVENT_TYPE,
                self.id.as_id(),
                correlation_id,
                clock.now(),
            ),
            kind: RaceEventKind::RaceCompetitorJoined(RaceCompetitorJoined {
                race_id: self.id,
                competitor_id,
            }),
        });
        Ok(())
    }

    /// The race identifier.
    #[must_use]
    pub fn id(&self) -> RaceId {
        self.id
    }

    /// The race name.
    #[must_use]
    pub fn name(&self) -> &RaceName {
        &self.name
    }

    /// When the race takes place.
    #[must_use]
    pub fn date(&self) -> RaceDate {
        self.date
    }

    /// The user who created the race.
    #[must_use]
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Registered competitors, ordered by id.
    #[must_use]
    pub fn competitors(&self) -> &BTreeSet<UserId> {
        &self.competitors
    }

    /// Returns `true` if `user_id` competes in this race.
    #[must_use]
    pub fn has_competitor(&self, user_id: UserId) -> bool {
        self.competitors.contains(&user_id)
    }

    /// Copy of the race without pending events.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self::new(
            self.id,
            self.name.clone(),
            self.date,
            self.owner,
            RaceOptions {
                competitors: self.competitors.clone(),
            },
        )
    }
}

impl AggregateRoot for Race {
    type Event = RaceEvent;

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
