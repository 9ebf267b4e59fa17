//! Shared application state.

use std::sync::Arc;

use racers_core::clock::Clock;
use racers_core::event_bus::{EventBus, InMemoryEventBus};
use racers_core::unit_of_work::{StagedUnitOfWork, UnitOfWork};
use racers_races::application::service::RacesService;
use racers_races::infrastructure::memory::InMemoryRacesRepository;
use racers_store::{
    PgEventBus, PgRacesRepository, PgTeamsRepository, PgUnitOfWork, PgUsersRepository,
};
use racers_teams::application::service::TeamsService;
use racers_teams::infrastructure::memory::InMemoryTeamsRepository;
use racers_users::application::service::UsersService;
use racers_users::infrastructure::memory::InMemoryUsersRepository;
use serde::Serialize;
use sqlx::PgPool;

/// Where the services keep their state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Storage {
    /// PostgreSQL through `racers-store`.
    Postgres,
    /// Process memory; lost on restart.
    InMemory,
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// User registration and lookup.
    pub users: UsersService,
    /// Race creation, lookup and joins.
    pub races: RacesService,
    /// Team creation, lookup and joins.
    pub teams: TeamsService,
    /// Backing storage, reported by the health check.
    pub storage: Storage,
}

impl AppState {
    /// Builds services backed by PostgreSQL.
    #[must_use]
    pub fn postgres(pool: &PgPool, clock: Arc<dyn Clock>) -> Self {
        let users = Arc::new(PgUsersRepository::new(pool.clone()));
        let unit_of_work: Arc<dyn UnitOfWork> = Arc::new(PgUnitOfWork::new(pool.clone()));
        let event_bus: Arc<dyn EventBus> = Arc::new(PgEventBus::new(pool.clone()));

        Self {
            users: UsersService::new(
                users.clone(),
                Arc::clone(&unit_of_work),
                Arc::clone(&event_bus),
                Arc::clone(&clock),
            ),
            races: RacesService::new(
                Arc::new(PgRacesRepository::new(pool.clone())),
                users.clone(),
                Arc::clone(&unit_of_work),
                Arc::clone(&event_bus),
                Arc::clone(&clock),
            ),
            teams: TeamsService::new(
                Arc::new(PgTeamsRepository::new(pool.clone())),
                users,
                unit_of_work,
                event_bus,
                clock,
            ),
            storage: Storage::Postgres,
        }
    }

    /// Builds services over in-memory collaborators sharing one staged unit
    /// of work. State lives as long as the process.
    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::in_memory_with_bus(InMemoryEventBus::new(), clock)
    }

    /// Like [`AppState::in_memory`], publishing to `event_bus` so callers can
    /// inspect what was published.
    #[must_use]
    pub fn in_memory_with_bus(event_bus: InMemoryEventBus, clock: Arc<dyn Clock>) -> Self {
        let users = Arc::new(InMemoryUsersRepository::new());
        let unit_of_work: Arc<dyn UnitOfWork> = Arc::new(StagedUnitOfWork::new());
        let event_bus: Arc<dyn EventBus> = Arc::new(event_bus);

        Self {
            users: UsersService::new(
                users.clone(),
                Arc::clone(&unit_of_work),
                Arc::clone(&event_bus),
                Arc::clone(&clock),
            ),
            races: RacesService::new(
                Arc::new(InMemoryRacesRepository::new()),
                users.clone(),
                Arc::clone(&unit_of_work),
                Arc::clone(&event_bus),
                Arc::clone(&clock),
            ),
            teams: TeamsService::new(
                Arc::new(InMemoryTeamsRepository::new()),
                users,
                unit_of_work,
                event_bus,
                clock,
            ),
            storage: Storage::InMemory,
        }
    }
}
