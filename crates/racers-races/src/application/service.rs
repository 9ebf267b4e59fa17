//! Races application service.

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

use crate::application::repository::RacesRepository;
use crate::domain::aggregates::Race;
use crate::domain::commands::{CreateRace, JoinRace};
use crate::domain::errors::{
    RaceAlreadyExistsError, RaceByIdNotFoundError, RaceInputError, RacesError,
};
use crate::domain::values::{RaceDate, RaceId, RaceName};

/// Orchestrates race creation, lookup and competitor registration.
#[derive(Clone)]
pub struct RacesService {
    races: Arc<dyn RacesRepository>,
    users: Arc<dyn UsersGetter>,
    unit_of_work: Arc<dyn UnitOfWork>,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
}

impl RacesService {
    /// Creates the service from its collaborators.
    #[must_use]
    pub fn new(
        races: Arc<dyn RacesRepository>,
        users: Arc<dyn UsersGetter>,
        unit_of_work: Arc<dyn UnitOfWork>,
        event_bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            races,
            users,
            unit_of_work,
            event_bus,
            clock,
        }
    }

    /// Creates a race and publishes `RaceCreated` in one unit of work.
    ///
    /// The returned race has no pending events.
    ///
    /// # Errors
    ///
    /// - `RacesError::Invalid` with every rejected field.
    /// - `RacesError::UserNotFound` if the owner does not exist.
    /// - `RacesError::AlreadyExists` if a race with the same name and date exists.
    /// - `RacesError::Internal` / `RacesError::Cancelled` on collaborator failure.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id()))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        command: CreateRace,
    ) -> Result<Race, RacesError> {
        let mut errors = ValidationErrors::<RaceInputError>::new();
        let id = errors.check(RaceId::parse(&command.id));
        let name = errors.check(RaceName::new(command.name));
        let date = errors.check(RaceDate::new(command.date, self.clock.as_ref()));
        let owner = errors.check(UserId::parse(&command.owner_id));
        let (Some(id), Some(name), Some(date), Some(owner)) = (id, name, date, owner) else {
            info!(%errors, "rejected race input");
            return Err(errors.into());
        };

        let owner = self.user(ctx, owner, "fetching race owner").await?;

        let mut race = Race::create(
            id,
            name,
            date,
            owner.id(),
            ctx.correlation_id(),
            self.clock.as_ref(),
        );
        let exists = self
            .races
            .exists(ctx, &race)
            .await
            .map_err(RacesError::infrastructure("checking race existence"))?;
        if exists {
            warn!(race_name = %race.name(), race_date = %race.date(), "race already exists");
            return Err(RaceAlreadyExistsError {
                name: race.name().clone(),
                date: race.date(),
            }
            .into());
        }

        self.persist(ctx, &mut race, "saving race").await?;

        info!(race_id = %id, "race created");
        Ok(race)
    }

    /// Loads a race by id.
    ///
    /// # Errors
    ///
    /// - `RacesError::Invalid` if `id` does not parse.
    /// - `RacesError::RaceNotFound` if no such race exists.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id()))]
    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Race, RacesError> {
        let mut errors = ValidationErrors::<RaceInputError>::new();
        let Some(id) = errors.check(RaceId::parse(id)) else {
            return Err(errors.into());
        };

        self.race(ctx, id, "fetching race").await
    }

    /// Adds a user to a race's competitors and publishes
    /// `RaceCompetitorJoined` in one unit of work.
    ///
    /// # Errors
    ///
    /// - `RacesError::Invalid` with every rejected id.
    /// - `RacesError::RaceNotFound` / `RacesError::UserNotFound`.
    /// - `RacesError::CompetitorInRace` if the user already joined.
    /// - `RacesError::Internal` / `RacesError::Cancelled` on collaborator failure.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id()))]
    pub async fn join(&self, ctx: &RequestContext, command: JoinRace) -> Result<Race, RacesError> {
        let mut errors = ValidationErrors::<RaceInputError>::new();
        let race_id = errors.check(RaceId::parse(&command.race_id));
        let user_id = errors.check(UserId::parse(&command.user_id));
        let (Some(race_id), Some(user_id)) = (race_id, user_id) else {
            info!(%errors, "rejected join input");
            return Err(errors.into());
        };

        let mut race = self.race(ctx, race_id, "fetching race to join").await?;
        let user = self.user(ctx, user_id, "fetching user to join").await?;

        race.join(&user, ctx.correlation_id(), self.clock.as_ref())
            .inspect_err(|err| warn!(%err, "join rejected"))?;

        self.persist(ctx, &mut race, "saving race").await?;

        info!(race_id = %race_id, user_id = %user_id, "competitor joined race");
        Ok(race)
    }

    /// Lists every race.
    ///
    /// # Errors
    ///
    /// `RacesError::Internal` / `RacesError::Cancelled` on collaborator failure.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id()))]
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Race>, RacesError> {
        self.races
            .all(ctx)
            .await
            .map_err(RacesError::infrastructure("listing races"))
    }

    async fn race(
        &self,
        ctx: &RequestContext,
        id: RaceId,
        operation: &'static str,
    ) -> Result<Race, RacesError> {
        self.races
            .by_id(ctx, id)
            .await
            .map_err(RacesError::infrastructure(operation))?
            .ok_or_else(|| RaceByIdNotFoundError(id).into())
    }

    async fn user(
        &self,
        ctx: &RequestContext,
        id: UserId,
        operation: &'static str,
    ) -> Result<User, RacesError> {
        self.users
            .get(ctx, id)
            .await
            .map_err(RacesError::infrastructure(operation))?
            .ok_or_else(|| UserByIdNotFoundError(id).into())
    }

    async fn persist(
        &self,
        ctx: &RequestContext,
        race: &mut Race,
        operation: &'static str,
    ) -> Result<(), RacesError> {
        let races = &self.races;
        let event_bus = &self.event_bus;
        self.unit_of_work
            .run(
                ctx,
                work(move |tx| async move {
                    let events: Vec<EventEnvelope> =
                        race.consume_events().iter().map(DomainEvent::to_envelope).collect();
                    races.save(&tx, race).await?;
                    event_bus.publish(&tx, events).await
                }),
            )
            .await
            .map_err(RacesError::infrastructure(operation))
    }
}
