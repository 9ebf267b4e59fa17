//! Error taxonomy shared by all bounded contexts.

use thiserror::Error;

/// Failure raised by a storage or messaging collaborator.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// The request context was cancelled before the operation finished.
    #[error("operation cancelled")]
    Cancelled,

    /// A unit of work was opened inside another one.
    #[error("nested unit of work is not supported")]
    NestedUnitOfWork,

    /// Any other persistence or transport failure.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

/// Coarse classification used by transports to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input; the caller can fix it and retry.
    InvalidInput,
    /// A referenced entity does not exist.
    NotFound,
    /// A business rule rejected the operation.
    Conflict,
    /// Storage or bus failure; details stay server-side.
    Internal,
    /// The request was cancelled or timed out.
    Cancelled,
}

/// Errors that can be mapped onto an [`ErrorKind`].
pub trait Classify {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

impl Classify for InfrastructureError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Cancelled => ErrorKind::Cancelled,
            Self::NestedUnitOfWork | Self::Infrastructure(_) => ErrorKind::Internal,
        }
    }
}
