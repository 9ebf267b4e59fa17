//! Routes for the Teams bounded context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use racers_core::id::Id;
use racers_teams::domain::aggregates::Team;
use racers_teams::domain::commands::{CreateTeam, JoinTeam};
use racers_teams::domain::values::TeamId;
use racers_users::domain::values::UserId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::context::Ctx;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    /// Requested id; generated when omitted.
    pub id: Option<String>,
    /// Team name.
    pub name: String,
    /// Administrating user; the authenticated user when omitted.
    pub admin_id: Option<String>,
}

/// Request body for POST /{id}/join.
#[derive(Debug, Default, Deserialize)]
pub struct JoinTeamRequest {
    /// Joining user; the authenticated user when omitted.
    pub user_id: Option<String>,
}

/// A team as returned by the API.
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    /// Team id.
    pub id: TeamId,
    /// Team name.
    pub name: String,
    /// Administrating user.
    pub admin_id: UserId,
    /// Members ordered by id, admin included.
    pub members: Vec<UserId>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id(),
            name: team.name().as_str().to_owned(),
            admin_id: team.admin(),
            members: team.members().iter().copied().collect(),
        }
    }
}

fn user_or_current(ctx: &Ctx, user_id: Option<String>) -> Result<String, ApiError> {
    match user_id {
        Some(user_id) => Ok(user_id),
        None => Ok(ctx.require_user()?.to_string()),
    }
}

/// POST /
#[instrument(skip(state, ctx, request))]
async fn create_team(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(request): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let command = CreateTeam {
        id: request.id.unwrap_or_else(|| Id::generate().to_string()),
        name: request.name,
        admin_id: user_or_current(&ctx, request.admin_id)?,
    };
    let team = state.teams.create(&ctx, command).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse::from(&team))))
}

/// GET /{id}
#[instrument(skip(state, ctx))]
async fn get_team(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(id): Path<String>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state.teams.get(&ctx, &id).await?;
    Ok(Json(TeamResponse::from(&team)))
}

/// POST /{id}/join
#[instrument(skip(state, ctx, request))]
async fn join_team(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(id): Path<String>,
    Json(request): Json<JoinTeamRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let command = JoinTeam {
        team_id: id,
        user_id: user_or_current(&ctx, request.user_id)?,
    };
    let team = state.teams.join(&ctx, command).await?;
    Ok(Json(TeamResponse::from(&team)))
}

/// Returns the router for the teams context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_team))
        .route("/{id}", get(get_team))
        .route("/{id}/join", post(join_team))
}
