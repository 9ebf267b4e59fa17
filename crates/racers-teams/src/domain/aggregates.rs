//! Aggregate root for teams.

use std::collections::BTreeSet;

use racers_core::aggregate::{AggregateRoot, EventQueue};
use racers_core::clock::Clock;
use racers_core::event::EventMetadata;
use racers_core::id::Id;
use racers_users::domain::aggregates::User;
use racers_users::domain::values::UserId;

use super::errors::UserAlreadyInTeamError;
use super::events::{
    TEAM_CREATED_EVENT_TYPE, TeamCreated, TeamEvent, TeamEventKind, USER_JOINED_TEAM_EVENT_TYPE,
    UserJoinedTeam,
};
use super::values::{TeamId, TeamName};

/// Optional state applied when building a team.
#[derive(Debug, Clone, Default)]
pub struct TeamOptions {
    /// Members besides the admin. The admin is always added.
    pub members: BTreeSet<UserId>,
}

/// A team of users administered by one of them.
///
/// Only guards membership within this team. Exclusivity across teams is
/// checked by `TeamsService` against the repository.
#[derive(Debug, Clone)]
pub struct Team {
    id: TeamId,
    name: TeamName,
    admin: UserId,
    members: BTreeSet<UserId>,
    events: EventQueue<TeamEvent>,
}

impl Team {
    /// Rebuilds a team from stored state. Records no event.
    #[must_use]
    pub fn new(id: TeamId, name: TeamName, admin: UserId, options: TeamOptions) -> Self {
        let mut members = options.members;
        members.insert(admin);
        Self {
            id,
            name,
            admin,
            members,
            events: EventQueue::new(),
        }
    }

    /// Creates a team with `admin` as its first member, producing a
    /// `TeamCreated` event.
    #[must_use]
    pub fn create(
        id: TeamId,
        name: TeamName,
        admin: &User,
        correlation_id: Id,
        clock: &dyn Clock,
    ) -> Self {
        let mut team = Self::new(id, name, admin.id(), TeamOptions::default());
        let event = TeamEvent {
            metadata: EventMetadata::record(
                TEAM_CREATED_EVENT_TYPE,
                id.as_id(),
                correlation_id,
                clock.now(),
            ),
            kind: TeamEventKind::TeamCreated(TeamCreated {
                team_id: id,
                name: team.name.clone(),
                admin_id: team.admin,
                members: team.members.clone(),
            }),
        };
        team.events.record(event);
        team
    }

    /// Adds `user` to the members, producing a `UserJoinedTeam` event.
    ///
    /// # Errors
    ///
    /// Returns `UserAlreadyInTeamError` naming this team if the user is
    /// already a member. No event is recorded in that case.
    pub fn join(
        &mut self,
        user: &User,
        correlation_id: Id,
        clock: &dyn Clock,
    ) -> Result<(), UserAlreadyInTeamError> {
        let user_id = user.id();
        if !self.members.insert(user_id) {
            return Err(UserAlreadyInTeamError {
                user_id,
                team_id: self.id,
            });
        }

        self.events.record(TeamEvent {
            metadata: EventMetadata::record(
                USER_JOINED_TEAM_EVENT_TYPE,
                self.id.as_id(),
                correlation_id,
                clock.now(),
            ),
            kind: TeamEventKind::UserJoinedTeam(UserJoinedTeam {
                team_id: self.id,
                user_id,
            }),
        });
        Ok(())
    }

    /// The team identifier.
    #[must_use]
    pub fn id(&self) -> TeamId {
        self.id
    }

    /// The team name.
    #[must_use]
    pub fn name(&self) -> &TeamName {
        &self.name
    }

    /// The administrating user.
    #[must_use]
    pub fn admin(&self) -> UserId {
        self.admin
    }

    /// Members ordered by id, admin included.
    #[must_use]
    pub fn members(&self) -> &BTreeSet<UserId> {
        &self.members
    }

    /// Returns `true` if `user_id` belongs to this team.
    #[must_use]
    pub fn has_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }

    /// Copy of the team without pending events.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self::new(
            self.id,
            self.name.clone(),
            self.admin,
            TeamOptions {
                members: self.members.clone(),
            },
        )
    }
}

impl AggregateRoot for Team {
    type Event = TeamEvent;

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
