//! PostgreSQL race repository.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_core::id::Id;
use racers_races::application::repository::{RacesGetter, RacesRepository};
use racers_races::domain::aggregates::{Race, RaceOptions};
use racers_races::domain::values::{RaceDate, RaceId, RaceName};
use racers_users::domain::values::UserId;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::connection::{Connection, corrupt_row, database};

#[derive(Debug, sqlx::FromRow)]
struct RaceRow {
    id: Uuid,
    name: String,
    date: DateTime<Utc>,
    owner_id: Uuid,
}

impl RaceRow {
    fn into_race(self, competitors: BTreeSet<UserId>) -> Result<Race, InfrastructureError> {
        let name = RaceName::new(self.name).map_err(|err| corrupt_row("races", err))?;
        Ok(Race::new(
            RaceId::from(Id::from(self.id)),
            name,
            RaceDate::restore(self.date),
            UserId::from(Id::from(self.owner_id)),
            RaceOptions { competitors },
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CompetitorRow {
    race_id: Uuid,
    user_id: Uuid,
}

/// Races stored in the `races` and `race_competitors` tables. The schema's
/// `UNIQUE (name, date)` backs `exists` under concurrent creates.
#[derive(Debug, Clone)]
pub struct PgRacesRepository {
    pool: PgPool,
}

impl PgRacesRepository {
    /// Creates a repository over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn competitors_of(
    conn: &mut PgConnection,
    race_id: Uuid,
) -> Result<BTreeSet<UserId>, sqlx::Error> {
    let ids: Vec<Uuid> =
        sqlx::query_scalar("SELECT user_id FROM race_competitors WHERE race_id = $1")
            .bind(race_id)
            .fetch_all(conn)
            .await?;
    Ok(ids.into_iter().map(|id| UserId::from(Id::from(id))).collect())
}

#[async_trait]
impl RacesGetter for PgRacesRepository {
    #[instrument(skip(self, ctx), fields(race_id = %id))]
    async fn by_id(
        &self,
        ctx: &RequestContext,
        id: RaceId,
    ) -> Result<Option<Race>, InfrastructureError> {
        let mut conn = Connection::acquire(ctx, &self.pool).await?;
        let conn = conn.get()?;
        let loaded = ctx
            .guard(async {
                let row: Option<RaceRow> =
                    sqlx::query_as("SELECT id, name, date, owner_id FROM races WHERE id = $1")
                        .bind(id.as_id().as_uuid())
                        .fetch_optional(&mut *conn)
                        .await
                        .map_err(database("loading race"))?;
                let Some(row) = row else {
                    return Ok(None);
                };
                let competitors = competitors_of(&mut *conn, row.id)
                    .await
                    .map_err(database("loading competitors"))?;
                Ok(Some((row, competitors)))
            })
            .await?;
        loaded
            .map(|(row, competitors)| row.into_race(competitors))
            .transpose()
    }

    #[instrument(skip(self, ctx))]
    async fn all(&self, ctx: &RequestContext) -> Result<Vec<Race>, InfrastructureError> {
        let mut conn = Connection::acquire(ctx, &self.pool).await?;
        let conn = conn.get()?;
        let (rows, competitors) = ctx
            .guard(async {
                let rows: Vec<RaceRow> = sqlx::query_as(
                    "SELECT id, name, date, owner_id FROM races ORDER BY date, name",
                )
                .fetch_all(&mut *conn)
                .await
                .map_err(database("listing races"))?;
                let competitors: Vec<CompetitorRow> =
                    sqlx::query_as("SELECT race_id, user_id FROM race_competitors")
                        .fetch_all(&mut *conn)
                        .await
                        .map_err(database("listing competitors"))?;
                Ok((rows, competitors))
            })
            .await?;

        let mut by_race: HashMap<Uuid, BTreeSet<UserId>> = HashMap::new();
        for row in competitors {
            by_race
                .entry(row.race_id)
                .or_default()
                .insert(UserId::from(Id::from(row.user_id)));
        }
        rows.into_iter()
            .map(|row| {
                let competitors = by_race.remove(&row.id).unwrap_or_default();
                row.into_race(competitors)
            })
            .collect()
    }
}

#[async_trait]
impl RacesRepository for PgRacesRepository {
    #[instrument(skip(self, ctx, candidate), fields(race_name = %candidate.name()))]
    async fn exists(
        &self,
        ctx: &RequestContext,
        candidate: &Race,
    ) -> Result<bool, InfrastructureError> {
        let mut conn = Connection::acquire(ctx, &self.pool).await?;
        let conn = conn.get()?;
        ctx.guard(async {
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM races WHERE name = $1 AND date = $2)")
                .bind(candidate.name().as_str())
                .bind(candidate.date().as_datetime())
                .fetch_one(&mut *conn)
                .await
                .map_err(database("checking race existence"))
        })
        .await
    }

    /// Upserts the race row and adds any competitor not yet stored.
    #[instrument(skip(self, ctx, race), fields(race_id = %race.id()))]
    async fn save(&self, ctx: &RequestContext, race: &Race) -> Result<(), InfrastructureError> {
        let mut conn = Connection::acquire(ctx, &self.pool).await?;
        let conn = conn.get()?;
        let race_id = race.id().as_id().as_uuid();
        ctx.guard(async {
            sqlx::query(
                r"
                INSERT INTO races (id, name, date, owner_id)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name, date = EXCLUDED.date, owner_id = EXCLUDED.owner_id
                ",
            )
            .bind(race_id)
            .bind(race.name().as_str())
            .bind(race.date().as_datetime())
            .bind(race.owner().as_id().as_uuid())
            .execute(&mut *conn)
            .await
            .map_err(database("saving race"))?;

            if !race.competitors().is_empty() {
                let mut qb =
                    QueryBuilder::<Postgres>::new("INSERT INTO race_competitors (race_id, user_id) ");
                qb.push_values(race.competitors(), |mut b, user_id| {
                    b.push_bind(race_id);
                    b.push_bind(user_id.as_id().as_uuid());
                });
                qb.push(" ON CONFLICT (race_id, user_id) DO NOTHING");
                qb.build()
                    .execute(&mut *conn)
                    .await
                    .map_err(database("saving competitors"))?;
            }
            Ok(())
        })
        .await
    }
}
