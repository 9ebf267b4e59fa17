//! Error types for the Races context.

use racers_core::error::{Classify, ErrorKind, InfrastructureError};
use racers_core::validation::ValidationErrors;
use racers_users::domain::errors::UserByIdNotFoundError;
use racers_users::domain::values::{InvalidUserIdError, UserId};
use thiserror::Error;
use tracing::error;

use super::values::{
    InvalidRaceDateError, InvalidRaceIdError, InvalidRaceNameError, RaceDate, RaceId, RaceName,
};

/// No race exists with the given id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("race {0} not found")]
pub struct RaceByIdNotFoundError(pub RaceId);

/// A race with the same name and date already exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("race {name} on {date} already exists")]
pub struct RaceAlreadyExistsError {
    /// The colliding name.
    pub name: RaceName,
    /// The colliding date.
    pub date: RaceDate,
}

/// The user already competes in the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("competitor {competitor_id} already joined race {race_id}")]
pub struct CompetitorInRaceError {
    /// The race.
    pub race_id: RaceId,
    /// The competitor.
    pub competitor_id: UserId,
}

/// A single rejected field of a race command.
#[derive(Debug, Error)]
pub enum RaceInputError {
    /// The race id did not parse.
    #[error(transparent)]
    Id(#[from] InvalidRaceIdError),
    /// The race name was empty.
    #[error(transparent)]
    Name(#[from] InvalidRaceNameError),
    /// The race date was in the past.
    #[error(transparent)]
    Date(#[from] InvalidRaceDateError),
    /// A user id did not parse.
    #[error(transparent)]
    UserId(#[from] InvalidUserIdError),
}

/// Failure of a races service operation.
#[derive(Debug, Error)]
pub enum RacesError {
    /// One or more fields were invalid.
    #[error("invalid race input: {0}")]
    Invalid(#[from] ValidationErrors<RaceInputError>),

    /// The race does not exist.
    #[error(transparent)]
    RaceNotFound(#[from] RaceByIdNotFoundError),

    /// The referenced user does not exist.
    #[error(transparent)]
    UserNotFound(#[from] UserByIdNotFoundError),

    /// A race with the same name and date exists.
    #[error(transparent)]
    AlreadyExists(#[from] RaceAlreadyExistsError),

    /// The user already joined the race.
    #[error(transparent)]
    CompetitorInRace(#[from] CompetitorInRaceError),

    /// A collaborator failed.
    #[error("internal error while {operation}")]
    Internal {
        /// What the service was doing.
        operation: &'static str,
        /// The collaborator failure.
        #[source]
        source: InfrastructureError,
    },

    /// The request was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl RacesError {
    /// Classifies a collaborator failure raised while doing `operation`.
    pub(crate) fn infrastructure(
        operation: &'static str,
    ) -> impl FnOnce(InfrastructureError) -> Self {
        move |source| match source {
            InfrastructureError::Cancelled => Self::Cancelled,
            source => {
                error!(operation, error = %source, "races operation failed");
                Self::Internal { operation, source }
            }
        }
    }
}

impl Classify for RacesError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) => ErrorKind::InvalidInput,
            Self::RaceNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) | Self::CompetitorInRace(_) => ErrorKind::Conflict,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}
