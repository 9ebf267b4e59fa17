//! Teams application service.

use std::sync::Arc;

use racers_core::aggregate::AggregateRoot;
use racers_core::clock::Clock;
use racers_core::context::RequestContext;
use racers_core::event::{DomainEvent, EventEnvelope};
use racers_core::event_bus::EventBus;
use racers_core::unit_of_work::{UnitOfWork, work};
use racers_core::validation::ValidationErrors;
use racers_users::application::repository::UsersGetter;
use racers_users::domain::aggregates::User;
use racers_users::domain::errors::UserByIdNotFoundError;
use racers_users::domain::values::UserId;
use tracing::{info, instrument, warn};

use crate::application::repository::TeamsRepository;
use crate::domain::aggregates::Team;
use crate::domain::commands::{CreateTeam, JoinTeam};
use crate::domain::errors::{
    TeamByIdNotFoundError, TeamInputError, TeamsError, UserAlreadyInTeamError,
};
use crate::domain::values::{TeamId, TeamName};

/// Orchestrates team creation and membership.
#[derive(Clone)]
pub struct TeamsService {
    teams: Arc<dyn TeamsRepository>,
    users: Arc<dyn UsersGetter>,
    unit_of_work: Arc<dyn UnitOfWork>,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
}

impl TeamsService {
    /// Creates the service from its collaborators.
    #[must_use]
    pub fn new(
        teams: Arc<dyn TeamsRepository>,
        users: Arc<dyn UsersGetter>,
        unit_of_work: Arc<dyn UnitOfWork>,
        event_bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            teams,
            users,
            unit_of_work,
            event_bus,
            clock,
        }
    }

    /// Creates a team administered by an existing user and publishes
    /// `TeamCreated` in one unit of work.
    ///
    /// # Errors
    ///
    /// - `TeamsError::Invalid` with every rejected field.
    /// - `TeamsError::UserNotFound` if the admin does not exist.
    /// - `TeamsError::UserAlreadyInTeam` if the admin belongs to another team.
    /// - `TeamsError::Internal` / `TeamsError::Cancelled` on collaborator failure.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id()))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        command: CreateTeam,
    ) -> Result<Team, TeamsError> {
        let mut errors = ValidationErrors::<TeamInputError>::new();
        let id = errors.check(TeamId::parse(&command.id));
        let name = errors.check(TeamName::new(command.name));
        let admin_id = errors.check(UserId::parse(&command.admin_id));
        let (Some(id), Some(name), Some(admin_id)) = (id, name, admin_id) else {
            info!(%errors, "rejected team input");
            return Err(errors.into());
        };

        let admin = self.user(ctx, admin_id, "fetching team admin").await?;
        self.ensure_teamless(ctx, admin_id).await?;

        let mut team = Team::create(id, name, &admin, ctx.correlation_id(), self.clock.as_ref());
        self.persist(ctx, &mut team, "saving team").await?;

        info!(team_id = %id, admin_id = %admin_id, "team created");
        Ok(team)
    }

    /// Loads a team by id.
    ///
    /// # Errors
    ///
    /// - `TeamsError::Invalid` if `id` does not parse.
    /// - `TeamsError::TeamNotFound` if no such team exists.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id()))]
    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Team, TeamsError> {
        let mut errors = ValidationErrors::<TeamInputError>::new();
        let Some(id) = errors.check(TeamId::parse(id)) else {
            return Err(errors.into());
        };

        self.team(ctx, id, "fetching team").await
    }

    /// Adds a user to a team and publishes `UserJoinedTeam` in one unit of
    /// work. A user already in any team, this one included, is rejected.
    ///
    /// # Errors
    ///
    /// - `TeamsError::Invalid` with every rejected id.
    /// - `TeamsError::TeamNotFound` / `TeamsError::UserNotFound`.
    /// - `TeamsError::UserAlreadyInTeam` naming the user's current team.
    /// - `TeamsError::Internal` / `TeamsError::Cancelled` on collaborator failure.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id()))]
    pub async fn join(&self, ctx: &RequestContext, command: JoinTeam) -> Result<Team, TeamsError> {
        let mut errors = ValidationErrors::<TeamInputError>::new();
        let team_id = errors.check(TeamId::parse(&command.team_id));
        let user_id = errors.check(UserId::parse(&command.user_id));
        let (Some(team_id), Some(user_id)) = (team_id, user_id) else {
            info!(%errors, "rejected join input");
            return Err(errors.into());
        };

        let mut team = self.team(ctx, team_id, "fetching team to join").await?;
        let user = self.user(ctx, user_id, "fetching user to join").await?;
        self.ensure_teamless(ctx, user_id).await?;

        team.join(&user, ctx.correlation_id(), self.clock.as_ref())
            .inspect_err(|err| warn!(%err, "join rejected"))?;

        self.persist(ctx, &mut team, "saving team").await?;

        info!(team_id = %team_id, user_id = %user_id, "user joined team");
        Ok(team)
    }

    /// Fails if `user_id` already belongs to a team. Concurrent joins are
    /// only fully excluded by the storage's membership constraint.
    async fn ensure_teamless(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<(), TeamsError> {
        let current = self
            .teams
            .by_member(ctx, user_id)
            .await
            .map_err(TeamsError::infrastructure("fetching team by member"))?;
        match current {
            Some(existing) => {
                let err = UserAlreadyInTeamError {
                    user_id,
                    team_id: existing.id(),
                };
                warn!(%err, "membership rejected");
                Err(err.into())
            }
            None => Ok(()),
        }
    }

    async fn team(
        &self,
        ctx: &RequestContext,
        id: TeamId,
        operation: &'static str,
    ) -> Result<Team, TeamsError> {
        self.teams
            .by_id(ctx, id)
            .await
            .map_err(TeamsError::infrastructure(operation))?
            .ok_or_else(|| TeamByIdNotFoundError(id).into())
    }

    async fn user(
        &self,
        ctx: &RequestContext,
        id: UserId,
        operation: &'static str,
    ) -> Result<User, TeamsError> {
        self.users
            .get(ctx, id)
            .await
            .map_err(TeamsError::infrastructure(operation))?
            .ok_or_else(|| UserByIdNotFoundError(id).into())
    }

    async fn persist(
        &self,
        ctx: &RequestContext,
        team: &mut Team,
        operation: &'static str,
    ) -> Result<(), TeamsError> {
        let teams = &self.teams;
        let event_bus = &self.event_bus;
        self.unit_of_work
            .run(
                ctx,
                work(move |tx| async move {
                    let events: Vec<EventEnvelope> =
                        team.consume_events().iter().map(DomainEvent::to_envelope).collect();
                    teams.save(&tx, team).await?;
                    event_bus.publish(&tx, events).await
                }),
            )
            .await
            .map_err(TeamsError::infrastructure(operation))
    }
}
