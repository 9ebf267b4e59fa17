//! Routes for the Races bounded context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use chrono::{DateTime, Utc};
use racers_core::id::Id;
use racers_races::domain::aggregates::Race;
use racers_races::domain::commands::{CreateRace, JoinRace};
use racers_races::domain::values::RaceId;
use racers_users::domain::values::UserId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::context::Ctx;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /. The authenticated user becomes the owner.
#[derive(Debug, Deserialize)]
pub struct CreateRaceRequest {
    /// Requested id; generated when omitted.
    pub id: Option<String>,
    /// Race name.
    pub name: String,
    /// When the race takes place.
    pub date: DateTime<Utc>,
}

/// Request body for POST /{id}/join.
#[derive(Debug, Default, Deserialize)]
pub struct JoinRaceRequest {
    /// Joining user; the authenticated user when omitted.
    pub user_id: Option<String>,
}

/// A race as returned by the API.
#[derive(Debug, Serialize)]
pub struct RaceResponse {
    /// Race id.
    pub id: RaceId,
    /// Race name.
    pub name: String,
    /// When the race takes place.
    pub date: DateTime<Utc>,
    /// Creating user.
    pub owner_id: UserId,
    /// Competitors ordered by id.
    pub competitors: Vec<UserId>,
}

impl From<&Race> for RaceResponse {
    fn from(race: &Race) -> Self {
        Self {
            id: race.id(),
            name: race.name().as_str().to_owned(),
            date: race.date().as_datetime(),
            owner_id: race.owner(),
            competitors: race.competitors().iter().copied().collect(),
        }
    }
}

/// POST /
#[instrument(skip(state, ctx, request))]
async fn create_race(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(request): Json<CreateRaceRequest>,
) -> Result<(StatusCode, Json<RaceResponse>), ApiError> {
    let owner = ctx.require_user()?;
    let command = CreateRace {
        id: request.id.unwrap_or_else(|| Id::generate().to_string()),
        name: request.name,
        date: request.date,
        owner_id: owner.to_string(),
    };
    let race = state.races.create(&ctx, command).await?;
    Ok((StatusCode::CREATED, Json(RaceResponse::from(&race))))
}

/// GET /
#[instrument(skip(state, ctx))]
async fn list_races(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Vec<RaceResponse>>, ApiError> {
    let races = state.races.list(&ctx).await?;
    Ok(Json(races.iter().map(RaceResponse::from).collect()))
}

/// GET /{id}
#[instrument(skip(state, ctx))]
async fn get_race(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(id): Path<String>,
) -> Result<Json<RaceResponse>, ApiError> {
    let race = state.races.get(&ctx, &id).await?;
    Ok(Json(RaceResponse::from(&race)))
}

/// POST /{id}/join
#[instrument(skip(state, ctx, request))]
async fn join_race(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(id): Path<String>,
    Json(request): Json<JoinRaceRequest>,
) -> Result<Json<RaceResponse>, ApiError> {
    let user_id = match request.user_id {
        Some(user_id) => user_id,
        None => ctx.require_user()?.to_string(),
    };
    let race = state
        .races
        .join(
            &ctx,
            JoinRace {
                race_id: id,
                user_id,
            },
        )
        .await?;
    Ok(Json(RaceResponse::from(&race)))
}

/// Returns the router for the races context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_race).get(list_races))
        .route("/{id}", get(get_race))
        .route("/{id}/join", post(join_race))
}
