//! Racers API error types.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use racers_core::error::{Classify, ErrorKind};
use racers_core::validation::ValidationErrors;
use racers_races::domain::errors::RacesError;
use racers_teams::domain::errors::TeamsError;
use racers_users::domain::errors::UsersError;
use serde::Serialize;
use thiserror::Error;

/// Status for a request the client abandoned or that ran out of time.
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Tracing or exporter setup failed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Metric registration failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// One entry per rejected field, for validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// HTTP-layer error carrying everything needed for the response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Vec<String>,
}

impl ApiError {
    /// The request carries no authenticated user.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "unauthenticated",
            message: "authentication required".into(),
            details: Vec::new(),
        }
    }

    /// A request header could not be parsed.
    #[must_use]
    pub fn invalid_header(name: &str, reason: impl fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "invalid_header",
            message: format!("invalid {name} header: {reason}"),
            details: Vec::new(),
        }
    }

    /// An unexpected server-side failure. The cause is logged, never sent.
    #[must_use]
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal_error",
            message: "internal server error".into(),
            details: Vec::new(),
        }
    }

    /// The response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Maps a classified service error. Internal details are never exposed.
    fn classified<E>(err: &E, details: Vec<String>) -> Self
    where
        E: Classify + fmt::Display,
    {
        let (status, code, message) = match err.kind() {
            ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, "invalid_input", err.to_string()),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "conflict", err.to_string()),
            ErrorKind::Internal => return Self::internal(),
            ErrorKind::Cancelled => (
                StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                    .unwrap_or(StatusCode::REQUEST_TIMEOUT),
                "cancelled",
                "request cancelled".to_owned(),
            ),
        };
        Self {
            status,
            code,
            message,
            details,
        }
    }
}

fn field_details<E: fmt::Display>(errors: &ValidationErrors<E>) -> Vec<String> {
    errors.errors().iter().map(ToString::to_string).collect()
}

impl From<UsersError> for ApiError {
    fn from(err: UsersError) -> Self {
        let details = match &err {
            UsersError::Invalid(errors) => field_details(errors),
            _ => Vec::new(),
        };
        Self::classified(&err, details)
    }
}

impl From<RacesError> for ApiError {
    fn from(err: RacesError) -> Self {
        let details = match &err {
            RacesError::Invalid(errors) => field_details(errors),
            _ => Vec::new(),
        };
        Self::classified(&err, details)
    }
}

impl From<TeamsError> for ApiError {
    fn from(err: TeamsError) -> Self {
        let details = match &err {
            TeamsError::Invalid(errors) => field_details(errors),
            _ => Vec::new(),
        };
        Self::classified(&err, details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code,
            message: self.message,
            details: self.details,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use racers_core::error::InfrastructureError;
    use racers_core::id::Id;
    use racers_races::domain::errors::{CompetitorInRaceError, RaceInputError};
    use racers_races::domain::values::{RaceId, RaceName};
    use racers_teams::domain::errors::{TeamByIdNotFoundError, UserAlreadyInTeamError};
    use racers_teams::domain::values::TeamId;
    use racers_users::domain::values::UserId;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_validation_maps_to_400_with_details() {
        let mut errors = ValidationErrors::<RaceInputError>::new();
        errors.check(RaceId::parse(""));
        errors.check(RaceName::new(""));

        let api: ApiError = RacesError::Invalid(errors).into();

        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.details.len(), 2);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(TeamsError::TeamNotFound(TeamByIdNotFoundError(TeamId::from(
                Id::generate()
            )))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflicts_map_to_409() {
        assert_eq!(
            status_of(RacesError::CompetitorInRace(CompetitorInRaceError {
                race_id: RaceId::from(Id::generate()),
                competitor_id: UserId::from(Id::generate()),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(TeamsError::UserAlreadyInTeam(UserAlreadyInTeamError {
                user_id: UserId::from(Id::generate()),
                team_id: TeamId::from(Id::generate()),
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_maps_to_500_without_detail() {
        let api: ApiError = UsersError::Internal {
            operation: "saving user",
            source: InfrastructureError::Infrastructure("password=hunter2".into()),
        }
        .into();

        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "internal server error");
    }

    #[test]
    fn test_cancelled_maps_to_499() {
        assert_eq!(status_of(UsersError::Cancelled).as_u16(), 499);
    }
}
