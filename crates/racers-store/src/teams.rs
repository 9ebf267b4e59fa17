//! PostgreSQL team repository.

use std::collections::BTreeSet;

use async_trait::async_trait;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_core::id::Id;
use racers_teams::application::repository::TeamsRepository;
use racers_teams::domain::aggregates::{Team, TeamOptions};
use racers_teams::domain::values::{TeamId, TeamName};
use racers_users::domain::values::UserId;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::connection::{Connection, corrupt_row, database};

#[derive(Debug, sqlx::FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
    admin_id: Uuid,
}

/// Teams stored in the `teams` and `team_members` tables. The schema's
/// `UNIQUE (user_id)` on members closes the window between the service's
/// membership check and the commit.
#[derive(Debug, Clone)]
pub struct PgTeamsRepository {
    pool: PgPool,
}

impl PgTeamsRepository {
    /// Creates a repository over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn load_team(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Team>, InfrastructureError> {
    let row: Option<TeamRow> = sqlx::query_as("SELECT id, name, admin_id FROM teams WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(database("loading team"))?;
    let Some(row) = row else {
        return Ok(None);
    };

    let members: Vec<Uuid> = sqlx::query_scalar("SELECT user_id FROM team_members WHERE team_id = $1")
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .map_err(database("loading team members"))?;
    let members: BTreeSet<UserId> = members
        .into_iter()
        .map(|id| UserId::from(Id::from(id)))
        .collect();

    let name = TeamName::new(row.name).map_err(|err| corrupt_row("teams", err))?;
    Ok(Some(Team::new(
        TeamId::from(Id::from(row.id)),
        name,
        UserId::from(Id::from(row.admin_id)),
        TeamOptions { members },
    )))
}

#[async_trait]
impl TeamsRepository for PgTeamsRepository {
    #[instrument(skip(self, ctx), fields(team_id = %id))]
    async fn by_id(
        &self,
        ctx: &RequestContext,
        id: TeamId,
    ) -> Result<Option<Team>, InfrastructureError> {
        let mut conn = Connection::acquire(ctx, &self.pool).await?;
        let conn = conn.get()?;
        ctx.guard(load_team(conn, id.as_id().as_uuid())).await
    }

    #[instrument(skip(self, ctx), fields(user_id = %user_id))]
    async fn by_member(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<Option<Team>, InfrastructureError> {
        let mut conn = Connection::acquire(ctx, &self.pool).await?;
        let conn = conn.get()?;
        ctx.guard(async {
            let team_id: Option<Uuid> =
                sqlx::query_scalar("SELECT team_id FROM team_members WHERE user_id = $1")
                    .bind(user_id.as_id().as_uuid())
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(database("finding team by member"))?;
            match team_id {
                Some(team_id) => load_team(conn, team_id).await,
                None => Ok(None),
            }
        })
        .await
    }

    #[instrument(skip(self, ctx, team), fields(team_id = %team.id()))]
    async fn save(&self, ctx: &RequestContext, team: &Team) -> Result<(), InfrastructureError> {
        let mut conn = Connection::acquire(ctx, &self.pool).await?;
        let conn = conn.get()?;
        let team_id = team.id().as_id().as_uuid();
        ctx.guard(async {
            sqlx::query(
                r"
                INSERT INTO teams (id, name, admin_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, admin_id = EXCLUDED.admin_id
                ",
            )
            .bind(team_id)
            .bind(team.name().as_str())
            .bind(team.admin().as_id().as_uuid())
            .execute(&mut *conn)
            .await
            .map_err(database("saving team"))?;

            // Conflicts on (team_id, user_id) are re-saves; a user stored
            // under another team still violates UNIQUE (user_id).
            let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO team_members (team_id, user_id) ");
            qb.push_values(team.members(), |mut b, user_id| {
                b.push_bind(team_id);
                b.push_bind(user_id.as_id().as_uuid());
            });
            qb.push(" ON CONFLICT (team_id, user_id) DO NOTHING");
            qb.build()
                .execute(&mut *conn)
                .await
                .map_err(database("saving team members"))?;
            Ok(())
        })
        .await
    }
}
