//! Error types for the Teams context.

use racers_core::error::{Classify, ErrorKind, InfrastructureError};
use racers_core::validation::ValidationErrors;
use racers_users::domain::errors::UserByIdNotFoundError;
use racers_users::domain::values::{InvalidUserIdError, UserId};
use thiserror::Error;
use tracing::error;

use super::values::{InvalidTeamIdError, InvalidTeamNameError, TeamId};

/// No team exists with the given id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("team {0} not found")]
pub struct TeamByIdNotFoundError(pub TeamId);

/// The user already belongs to a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("user {user_id} already belongs to team {team_id}")]
pub struct UserAlreadyInTeamError {
    /// The user.
    pub user_id: UserId,
    /// The team the user currently belongs to.
    pub team_id: TeamId,
}

/// A single rejected field of a team command.
#[derive(Debug, Error)]
pub enum TeamInputError {
    /// The team id did not parse.
    #[error(transparent)]
    Id(#[from] InvalidTeamIdError),
    /// The team name was empty.
    #[error(transparent)]
    Name(#[from] InvalidTeamNameError),
    /// A user id did not parse.
    #[error(transparent)]
    UserId(#[from] InvalidUserIdError),
}

/// Failure of a teams service operation.
#[derive(Debug, Error)]
pub enum TeamsError {
    /// One or more fields were invalid.
    #[error("invalid team input: {0}")]
    Invalid(#[from] ValidationErrors<TeamInputError>),

    /// The team does not exist.
    #[error(transparent)]
    TeamNotFound(#[from] TeamByIdNotFoundError),

    /// The referenced user does not exist.
    #[error(transparent)]
    UserNotFound(#[from] UserByIdNotFoundError),

    /// The user already belongs to a team.
    #[error(transparent)]
    UserAlreadyInTeam(#[from] UserAlreadyInTeamError),

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

impl TeamsError {
    /// Classifies a collaborator failure raised while doing `operation`.
    pub(crate) fn infrastructure(
        operation: &'static str,
    ) -> impl FnOnce(InfrastructureError) -> Self {
        move |source| match source {
            InfrastructureError::Cancelled => Self::Cancelled,
            source => {
                error!(operation, error = %source, "teams operation failed");
                Self::Internal { operation, source }
            }
        }
    }
}

impl Classify for TeamsError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) => ErrorKind::InvalidInput,
            Self::TeamNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::UserAlreadyInTeam(_) => ErrorKind::Conflict,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}
