//! PostgreSQL user repository.

use async_trait::async_trait;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_core::id::Id;
use racers_users::application::repository::{UsersGetter, UsersRepository};
use racers_users::domain::aggregates::User;
use racers_users::domain::values::{UserId, UserName};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::connection::{Connection, corrupt_row, database};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
}

impl UserRow {
    fn into_user(self) -> Result<User, InfrastructureError> {
        let name = UserName::new(self.name).map_err(|err| corrupt_row("users", err))?;
        Ok(User::new(UserId::from(Id::from(self.id)), name))
    }
}

/// Users stored in the `users` table.
#[derive(Debug, Clone)]
pub struct PgUsersRepository {
    pool: PgPool,
}

impl PgUsersRepository {
    /// Creates a repository over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersGetter for PgUsersRepository {
    #[instrument(skip(self, ctx), fields(user_id = %id))]
    async fn get(
        &self,
        ctx: &RequestContext,
        id: UserId,
    ) -> Result<Option<User>, InfrastructureError> {
        let mut conn = Connection::acquire(ctx, &self.pool).await?;
        let conn = conn.get()?;
        let row: Option<UserRow> = ctx
            .guard(async {
                sqlx::query_as("SELECT id, name FROM users WHERE id = $1")
                    .bind(id.as_id().as_uuid())
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(database("loading user"))
            })
            .await?;
        row.map(UserRow::into_user).transpose()
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    #[instrument(skip(self, ctx, user), fields(user_id = %user.id()))]
    async fn save(&self, ctx: &RequestContext, user: &User) -> Result<(), InfrastructureError> {
        let mut conn = Connection::acquire(ctx, &self.pool).await?;
        let conn = conn.get()?;
        ctx.guard(async {
            sqlx::query(
                r"
                INSERT INTO users (id, name)
                VALUES ($1, $2)
                ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
                ",
            )
            .bind(user.id().as_id().as_uuid())
            .bind(user.name().as_str())
            .execute(&mut *conn)
            .await
            .map_err(database("saving user"))
        })
        .await?;
        Ok(())
    }
}
