//! Users application service.

use std::sync::Arc;

use racers_core::aggregate::AggregateRoot;
use racers_core::clock::Clock;
use racers_core::context::RequestContext;
use racers_core::event::{DomainEvent, EventEnvelope};
use racers_core::event_bus::EventBus;
use racers_core::unit_of_work::{UnitOfWork, work};
use racers_core::validation::ValidationErrors;
use tracing::{info, instrument};

use crate::application::repository::UsersRepository;
use crate::domain::aggregates::User;
use crate::domain::commands::CreateUser;
use crate::domain::errors::{
    UserAlreadyExistsError, UserByIdNotFoundError, UserInputError, UsersError,
};
use crate::domain::values::{UserId, UserName};

/// Orchestrates user registration and lookup.
#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UsersRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
}

impl UsersService {
    /// Creates the service from its collaborators.
    #[must_use]
    pub fn new(
        users: Arc<dyn UsersRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
        event_bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            unit_of_work,
            event_bus,
            clock,
        }
    }

    /// Registers a user and publishes `UserCreated` in one unit of work.
    ///
    /// # Errors
    ///
    /// - `UsersError::Invalid` with every rejected field.
    /// - `UsersError::AlreadyExists` if the id is taken.
    /// - `UsersError::Internal` / `UsersError::Cancelled` on collaborator failure.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id()))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        command: CreateUser,
    ) -> Result<User, UsersError> {
        let mut errors = ValidationErrors::<UserInputError>::new();
        let id = errors.check(UserId::parse(&command.id));
        let name = errors.check(UserName::new(command.name));
        let (Some(id), Some(name)) = (id, name) else {
            info!(%errors, "rejected user input");
            return Err(errors.into());
        };

        let existing = self
            .users
            .get(ctx, id)
            .await
            .map_err(UsersError::infrastructure("looking up user"))?;
        if existing.is_some() {
            return Err(UserAlreadyExistsError(id).into());
        }

        let mut user = User::create(id, name, ctx.correlation_id(), self.clock.as_ref());
        self.persist(ctx, &mut user).await?;

        info!(user_id = %id, "user created");
        Ok(user)
    }

    /// Loads a user by id.
    ///
    /// # Errors
    ///
    /// - `UsersError::Invalid` if `id` does not parse.
    /// - `UsersError::NotFound` if no such user exists.
    #[instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id()))]
    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<User, UsersError> {
        let mut errors = ValidationErrors::<UserInputError>::new();
        let Some(id) = errors.check(UserId::parse(id)) else {
            return Err(errors.into());
        };

        self.users
            .get(ctx, id)
            .await
            .map_err(UsersError::infrastructure("fetching user"))?
            .ok_or_else(|| UserByIdNotFoundError(id).into())
    }

    /// Loads the authenticated user of the request, if any.
    ///
    /// # Errors
    ///
    /// `UsersError::Internal` / `UsersError::Cancelled` on collaborator failure.
    pub async fn current(&self, ctx: &RequestContext) -> Result<Option<User>, UsersError> {
        self.users
            .current(ctx)
            .await
            .map_err(UsersError::infrastructure("fetching current user"))
    }

    async fn persist(&self, ctx: &RequestContext, user: &mut User) -> Result<(), UsersError> {
        let users = &self.users;
        let event_bus = &self.event_bus;
        self.unit_of_work
            .run(
                ctx,
                work(move |tx| async move {
                    let events: Vec<EventEnvelope> =
                        user.consume_events().iter().map(DomainEvent::to_envelope).collect();
                    users.save(&tx, user).await?;
                    event_bus.publish(&tx, events).await
                }),
            )
            .await
            .map_err(UsersError::infrastructure("saving user"))
    }
}
