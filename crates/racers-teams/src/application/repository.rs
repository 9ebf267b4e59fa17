//! Collaborator contracts for team persistence.

use async_trait::async_trait;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_users::domain::values::UserId;

use crate::domain::aggregates::Team;
use crate::domain::values::TeamId;

/// Read/write access to teams.
///
/// Implementations backed by shared storage must make membership unique per
/// user, so two concurrent joins for one user cannot both commit.
#[async_trait]
pub trait TeamsRepository: Send + Sync {
    /// Loads a team. `Ok(None)` means no such team.
    async fn by_id(
        &self,
        ctx: &RequestContext,
        id: TeamId,
    ) -> Result<Option<Team>, InfrastructureError>;

    /// Loads the team `user_id` belongs to. `Ok(None)` means no team.
    async fn by_member(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<Option<Team>, InfrastructureError>;

    /// Inserts or replaces a team with its members. Joins the transaction
    /// carried by `ctx`.
    async fn save(&self, ctx: &RequestContext, team: &Team) -> Result<(), InfrastructureError>;
}
