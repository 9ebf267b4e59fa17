//! PostgreSQL collaborators for the racers service.
//!
//! Every repository and the event bus join the transaction that
//! [`PgUnitOfWork`] installs on the `RequestContext`; outside a unit of work
//! they run on a pooled connection.

mod connection;
pub mod event_bus;
pub mod races;
pub mod teams;
pub mod unit_of_work;
pub mod users;

use sqlx::PgPool;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;

pub use event_bus::PgEventBus;
pub use races::PgRacesRepository;
pub use teams::PgTeamsRepository;
pub use unit_of_work::{PgTransaction, PgUnitOfWork};
pub use users::PgUsersRepository;

/// Opens a connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database is unreachable.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Applies the schema migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history diverges.
#[tracing::instrument(skip(pool))]
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
