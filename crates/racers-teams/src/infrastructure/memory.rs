//! In-memory team store.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_core::unit_of_work::stage_checked_or_apply;
use racers_users::domain::values::UserId;

use crate::application::repository::TeamsRepository;
use crate::domain::aggregates::{Team, TeamOptions};
use crate::domain::values::TeamId;

/// Team repository backed by a shared map. Writes made under a staged unit
/// of work become visible on commit.
///
/// Saving adds members to the stored team instead of replacing them, and a
/// commit is rejected when one of the team's members is already stored
/// under another team.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTeamsRepository {
    teams: Arc<RwLock<HashMap<TeamId, Team>>>,
}

impl InMemoryTeamsRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a snapshot of `team` immediately, bypassing any unit of work.
    pub fn insert(&self, team: &Team) {
        self.teams.write().insert(team.id(), team.snapshot());
    }

    /// Number of stored teams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.teams.read().len()
    }

    /// Returns `true` if no team is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.teams.read().is_empty()
    }
}

#[async_trait]
impl TeamsRepository for InMemoryTeamsRepository {
    async fn by_id(
        &self,
        ctx: &RequestContext,
        id: TeamId,
    ) -> Result<Option<Team>, InfrastructureError> {
        ctx.ensure_active()?;
        Ok(self.teams.read().get(&id).map(Team::snapshot))
    }

    async fn by_member(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<Option<Team>, InfrastructureError> {
        ctx.ensure_active()?;
        Ok(self
            .teams
            .read()
            .values()
            .find(|team| team.has_member(user_id))
            .map(Team::snapshot))
    }

    async fn save(&self, ctx: &RequestContext, team: &Team) -> Result<(), InfrastructureError> {
        ctx.ensure_active()?;
        let incoming = team.snapshot();
        let teams = Arc::clone(&self.teams);
        stage_checked_or_apply(ctx, move || {
            let clash = teams.read().values().find_map(|stored| {
                if stored.id() == incoming.id() {
                    return None;
                }
                incoming
                    .members()
                    .iter()
                    .find(|&&user_id| stored.has_member(user_id))
                    .map(|&user_id| (user_id, stored.id()))
            });
            if let Some((user_id, existing)) = clash {
                return Err(InfrastructureError::Infrastructure(format!(
                    "user {user_id} is already a member of team {existing}"
                )));
            }
            Ok(move || {
                let mut teams = teams.write();
                let merged = match teams.get(&incoming.id()) {
                    Some(stored) => merge(stored, &incoming),
                    None => incoming,
                };
                teams.insert(merged.id(), merged);
            })
        })
    }
}

/// `incoming`'s fields with the members of both teams.
fn merge(stored: &Team, incoming: &Team) -> Team {
    let members: BTreeSet<_> = stored.members().union(incoming.members()).copied().collect();
    Team::new(
        incoming.id(),
        incoming.name().clone(),
        incoming.admin(),
        TeamOptions { members },
    )
}

#[cfg(test)]
mod tests {
    use racers_core::id::Id;
    use racers_core::unit_of_work::{StagedUnitOfWork, UnitOfWork, work};

    use super::*;
    use crate::domain::values::TeamName;

    fn team(name: &str, admin: UserId, members: &[UserId]) -> Team {
        Team::new(
            TeamId::from(Id::generate()),
            TeamName::new(name).unwrap(),
            admin,
            TeamOptions {
                members: members.iter().copied().collect(),
            },
        )
    }

    async fn save_in_unit_of_work(
        repo: &InMemoryTeamsRepository,
        team: &Team,
    ) -> Result<(), InfrastructureError> {
        StagedUnitOfWork::new()
            .run(
                &RequestContext::new(),
                work(move |tx| async move { repo.save(&tx, team).await }),
            )
            .await
    }

    #[tokio::test]
    async fn test_by_member_finds_admin_and_members() {
        // Arrange
        let repo = InMemoryTeamsRepository::new();
        let admin = UserId::from(Id::generate());
        let member = UserId::from(Id::generate());
        let team = Team::new(
            TeamId::from(Id::generate()),
            TeamName::new("Harriers").unwrap(),
            admin,
            TeamOptions {
                members: [member].into(),
            },
        );
        repo.insert(&team);
        let ctx = RequestContext::new();

        // Act
        let by_admin = repo.by_member(&ctx, admin).await.unwrap();
        let by_member = repo.by_member(&ctx, member).await.unwrap();
        let stranger = repo.by_member(&ctx, UserId::from(Id::generate())).await.unwrap();

        // Assert
        assert_eq!(by_admin.map(|t| t.id()), Some(team.id()));
        assert_eq!(by_member.map(|t| t.id()), Some(team.id()));
        assert!(stranger.is_none());
    }

    #[tokio::test]
    async fn test_save_keeps_members_added_by_a_concurrent_commit() {
        // Arrange
        let repo = InMemoryTeamsRepository::new();
        let admin = UserId::from(Id::generate());
        let first = UserId::from(Id::generate());
        let second = UserId::from(Id::generate());
        let stored = team("Harriers", admin, &[]);
        repo.insert(&stored);
        let with_member = |user_id: UserId| {
            Team::new(
                stored.id(),
                stored.name().clone(),
                admin,
                TeamOptions {
                    members: [user_id].into(),
                },
            )
        };

        // Act
        save_in_unit_of_work(&repo, &with_member(first)).await.unwrap();
        save_in_unit_of_work(&repo, &with_member(second)).await.unwrap();

        // Assert
        let loaded = repo
            .by_id(&RequestContext::new(), stored.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.members(), &BTreeSet::from([admin, first, second]));
    }

    #[tokio::test]
    async fn test_commit_rejects_member_of_another_team() {
        // Arrange
        let repo = InMemoryTeamsRepository::new();
        let rider = UserId::from(Id::generate());
        let harriers = team("Harriers", UserId::from(Id::generate()), &[rider]);
        repo.insert(&harriers);
        let pacers = team("Pacers", UserId::from(Id::generate()), &[rider]);

        // Act
        let result = save_in_unit_of_work(&repo, &pacers).await;

        // Assert
        match result {
            Err(InfrastructureError::Infrastructure(msg)) => {
                assert!(msg.contains(&harriers.id().to_string()));
            }
            other => panic!("expected Infrastructure, got {other:?}"),
        }
        assert_eq!(repo.len(), 1);
    }
}
