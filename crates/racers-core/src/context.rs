//! Request-scoped context threaded through every service, repository and
//! bus call.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::InfrastructureError;
use crate::id::Id;

/// Type-erased transactional handle installed by a [`UnitOfWork`].
///
/// [`UnitOfWork`]: crate::unit_of_work::UnitOfWork
pub type TransactionHandle = Arc<dyn Any + Send + Sync>;

/// Per-request state: correlation id, authenticated user, cancellation and
/// the active transaction, if any.
///
/// Cloning is cheap; clones share the cancellation token.
#[derive(Clone)]
pub struct RequestContext {
    correlation_id: Id,
    current_user: Option<Id>,
    cancellation: CancellationToken,
    transaction: Option<TransactionHandle>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Creates a context with a fresh correlation id and no user.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: Id::generate(),
            current_user: None,
            cancellation: CancellationToken::new(),
            transaction: None,
        }
    }

    /// Replaces the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Id) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Sets the authenticated user resolved by the transport.
    #[must_use]
    pub fn with_current_user(mut self, user_id: Id) -> Self {
        self.current_user = Some(user_id);
        self
    }

    /// Replaces the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns a copy of this context carrying `transaction`.
    #[must_use]
    pub fn with_transaction<T: Any + Send + Sync>(&self, transaction: Arc<T>) -> Self {
        let handle: TransactionHandle = transaction;
        let mut ctx = self.clone();
        ctx.transaction = Some(handle);
        ctx
    }

    /// Correlation id stamped on every event produced by this request.
    #[must_use]
    pub fn correlation_id(&self) -> Id {
        self.correlation_id
    }

    /// Authenticated user, if the transport resolved one.
    #[must_use]
    pub fn current_user(&self) -> Option<Id> {
        self.current_user
    }

    /// Token that cancels this request.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once the request has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fails with `InfrastructureError::Cancelled` if the request is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `InfrastructureError::Cancelled` when the token has fired.
    pub fn ensure_active(&self) -> Result<(), InfrastructureError> {
        if self.is_cancelled() {
            Err(InfrastructureError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Returns `true` if a transaction is installed.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Returns the installed transaction if it is of type `T`.
    #[must_use]
    pub fn transaction<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.transaction.clone()?.downcast::<T>().ok()
    }

    /// Drives `operation` to completion unless the request is cancelled
    /// first, in which case the operation is dropped.
    ///
    /// # Errors
    ///
    /// Returns `InfrastructureError::Cancelled` on cancellation, otherwise
    /// whatever `operation` returns.
    pub async fn guard<F, T>(&self, operation: F) -> Result<T, InfrastructureError>
    where
        F: Future<Output = Result<T, InfrastructureError>>,
    {
        tokio::select! {
            biased;
            () = self.cancellation.cancelled() => Err(InfrastructureError::Cancelled),
            result = operation => result,
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("correlation_id", &self.correlation_id)
            .field("current_user", &self.current_user)
            .field("cancelled", &self.is_cancelled())
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker(u8);

    #[test]
    fn test_transaction_downcasts_to_installed_type() {
        let ctx = RequestContext::new();
        let tx_ctx = ctx.with_transaction(Arc::new(Marker(3)));

        assert!(!ctx.in_transaction());
        assert_eq!(tx_ctx.transaction::<Marker>().map(|m| m.0), Some(3));
        assert!(tx_ctx.transaction::<String>().is_none());
    }

    #[test]
    fn test_clones_share_cancellation() {
        let ctx = RequestContext::new();
        let clone = ctx.clone();

        ctx.cancellation_token().cancel();

        assert!(clone.is_cancelled());
        assert!(matches!(
            clone.ensure_active(),
            Err(InfrastructureError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_guard_short_circuits_when_cancelled() {
        let ctx = RequestContext::new();
        ctx.cancellation_token().cancel();

        let result = ctx.guard(std::future::pending::<Result<(), _>>()).await;

        assert!(matches!(result, Err(InfrastructureError::Cancelled)));
    }

    #[tokio::test]
    async fn test_guard_returns_operation_result() {
        let ctx = RequestContext::new().with_current_user(Id::generate());

        let result = ctx.guard(async { Ok::<_, InfrastructureError>(42) }).await;

        assert_eq!(result.unwrap(), 42);
    }
}
