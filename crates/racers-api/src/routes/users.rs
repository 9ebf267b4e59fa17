//! Routes for the Users bounded context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use racers_core::id::Id;
use racers_users::domain::aggregates::User;
use racers_users::domain::commands::CreateUser;
use racers_users::domain::values::UserId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::context::Ctx;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Requested id; generated when omitted.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
}

/// A user as returned by the API.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User id.
    pub id: UserId,
    /// Display name.
    pub name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().as_str().to_owned(),
        }
    }
}

/// POST /
#[instrument(skip(state, ctx, request))]
async fn create_user(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let command = CreateUser {
        id: request.id.unwrap_or_else(|| Id::generate().to_string()),
        name: request.name,
    };
    let user = state.users.create(&ctx, command).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// GET /me
#[instrument(skip(state, ctx))]
async fn current_user(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<UserResponse>, ApiError> {
    ctx.require_user()?;
    let user = state
        .users
        .current(&ctx)
        .await?
        .ok_or_else(ApiError::unauthenticated)?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /{id}
#[instrument(skip(state, ctx))]
async fn get_user(
    State(state): State<AppState>,
    ctx: Ctx,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get(&ctx, &id).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Returns the router for the users context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/me", get(current_user))
        .route("/{id}", get(get_user))
}
