//! Domain events for the Teams context.

use std::collections::BTreeSet;

use racers_core::event::{DomainEvent, EventMetadata};
use racers_users::domain::values::UserId;
use serde::{Deserialize, Serialize};

use super::values::{TeamId, TeamName};

/// Event type name for `TeamCreated`.
pub const TEAM_CREATED_EVENT_TYPE: &str = "teams.team_created";
/// Event type name for `UserJoinedTeam`.
pub const USER_JOINED_TEAM_EVENT_TYPE: &str = "teams.user_joined";

/// Emitted when a team is created. Carries the full member snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamCreated {
    /// The team identifier.
    pub team_id: TeamId,
    /// The team name.
    pub name: TeamName,
    /// The administrating user.
    pub admin_id: UserId,
    /// Members at creation, admin included.
    pub members: BTreeSet<UserId>,
}

/// Emitted when a user joins a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserJoinedTeam {
    /// The team identifier.
    pub team_id: TeamId,
    /// The joining user.
    pub user_id: UserId,
}

/// Event payload variants for the Teams context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamEventKind {
    /// A team has been created.
    TeamCreated(TeamCreated),
    /// A user has joined a team.
    UserJoinedTeam(UserJoinedTeam),
}

/// Domain event envelope for the Teams context.
#[derive(Debug, Clone)]
pub struct TeamEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: TeamEventKind,
}

impl DomainEvent for TeamEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            TeamEventKind::TeamCreated(_) => TEAM_CREATED_EVENT_TYPE,
            TeamEventKind::UserJoinedTeam(_) => USER_JOINED_TEAM_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("TeamEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
