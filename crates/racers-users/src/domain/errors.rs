//! Error types for the Users context.

use racers_core::error::{Classify, ErrorKind, InfrastructureError};
use racers_core::validation::ValidationErrors;
use thiserror::Error;
use tracing::error;

use super::values::{InvalidUserIdError, InvalidUserNameError, UserId};

/// No user exists with the given id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("user {0} not found")]
pub struct UserByIdNotFoundError(pub UserId);

/// A user with the given id is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("user {0} already exists")]
pub struct UserAlreadyExistsError(pub UserId);

/// A single rejected field of a user command.
#[derive(Debug, Error)]
pub enum UserInputError {
    /// The user id did not parse.
    #[error(transparent)]
    Id(#[from] InvalidUserIdError),
    /// The user name was empty.
    #[error(transparent)]
    Name(#[from] InvalidUserNameError),
}

/// Failure of a users service operation.
#[derive(Debug, Error)]
pub enum UsersError {
    /// One or more fields were invalid.
    #[error("invalid user input: {0}")]
    Invalid(#[from] ValidationErrors<UserInputError>),

    /// The user does not exist.
    #[error(transparent)]
    NotFound(#[from] UserByIdNotFoundError),

    /// The user id is taken.
    #[error(transparent)]
    AlreadyExists(#[from] UserAlreadyExistsError),

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

impl UsersError {
    /// Classifies a collaborator failure raised while doing `operation`.
    pub(crate) fn infrastructure(
        operation: &'static str,
    ) -> impl FnOnce(InfrastructureError) -> Self {
        move |source| match source {
            InfrastructureError::Cancelled => Self::Cancelled,
            source => {
                error!(operation, error = %source, "users operation failed");
                Self::Internal { operation, source }
            }
        }
    }
}

impl Classify for UsersError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::Conflict,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}
