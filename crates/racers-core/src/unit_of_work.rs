//! Transactional boundary around repository writes and event publication.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::InfrastructureError;

/// Future returned by a unit of work body.
pub type WorkFuture<'a> =
    Pin<Box<dyn Future<Output = Result<(), InfrastructureError>> + Send + 'a>>;

/// Body of a unit of work. It receives a context carrying the active
/// transaction; every repository and bus call made with that context joins
/// the transaction.
pub type Work<'a> = Box<dyn FnOnce(RequestContext) -> WorkFuture<'a> + Send + 'a>;

/// Boxes an async closure into a [`Work`] body.
pub fn work<'a, F, Fut>(body: F) -> Work<'a>
where
    F: FnOnce(RequestContext) -> Fut + Send + 'a,
    Fut: Future<Output = Result<(), InfrastructureError>> + Send + 'a,
{
    Box::new(move |ctx| -> WorkFuture<'a> { Box::pin(body(ctx)) })
}

/// Runs a body so that all of its writes commit or roll back together.
///
/// If the body fails, every write made through the transactional context is
/// discarded and the error is returned unchanged. Units of work do not nest.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Runs `work` inside a transaction derived from `ctx`.
    async fn run<'a>(&self, ctx: &RequestContext, work: Work<'a>)
    -> Result<(), InfrastructureError>;
}

/// Unit of work that runs the body directly against the ambient context.
///
/// Nothing is rolled back; only suitable where every collaborator call is
/// harmless to repeat or leave half-done.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUnitOfWork;

#[async_trait]
impl UnitOfWork for NoopUnitOfWork {
    async fn run<'a>(
        &self,
        ctx: &RequestContext,
        work: Work<'a>,
    ) -> Result<(), InfrastructureError> {
        work(ctx.clone()).await
    }
}

type Apply = Box<dyn FnOnce() + Send>;
type StagedWrite = Box<dyn FnOnce() -> Result<Apply, InfrastructureError> + Send>;

/// Writes deferred by in-memory collaborators until their unit of work
/// commits.
///
/// Each write is checked against the committed state before any write is
/// applied, so a unit of work commits all of its writes or none of them.
#[derive(Default)]
pub struct StagedWrites {
    writes: Mutex<Vec<StagedWrite>>,
}

impl StagedWrites {
    /// Defers `write` until commit.
    pub fn stage(&self, write: impl FnOnce() + Send + 'static) {
        self.stage_checked(move || Ok(write));
    }

    /// Defers a write whose `check` runs at commit against the committed
    /// state. `check` returns the write to apply, or an error that rolls the
    /// whole unit of work back.
    pub fn stage_checked<W>(
        &self,
        check: impl FnOnce() -> Result<W, InfrastructureError> + Send + 'static,
    ) where
        W: FnOnce() + Send + 'static,
    {
        self.writes
            .lock()
            .push(Box::new(move || check().map(|write| Box::new(write) as Apply)));
    }

    /// Number of writes waiting for commit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.lock().len()
    }

    /// Returns `true` if no write is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply(&self) -> Result<usize, InfrastructureError> {
        let staged = std::mem::take(&mut *self.writes.lock());
        let writes = staged
            .into_iter()
            .map(|check| check())
            .collect::<Result<Vec<_>, _>>()?;
        let count = writes.len();
        for write in writes {
            write();
        }
        Ok(count)
    }
}

impl fmt::Debug for StagedWrites {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedWrites")
            .field("pending", &self.len())
            .finish()
    }
}

/// Stages `write` on the context's in-memory transaction, or applies it
/// immediately when the context carries none.
pub fn stage_or_apply(ctx: &RequestContext, write: impl FnOnce() + Send + 'static) {
    match ctx.transaction::<StagedWrites>() {
        Some(staged) => staged.stage(write),
        None => write(),
    }
}

/// Like [`stage_or_apply`] for a checked write. Without a transaction the
/// check runs immediately and its error is returned.
///
/// # Errors
///
/// Returns the check's error when it runs immediately and fails.
pub fn stage_checked_or_apply<W>(
    ctx: &RequestContext,
    check: impl FnOnce() -> Result<W, InfrastructureError> + Send + 'static,
) -> Result<(), InfrastructureError>
where
    W: FnOnce() + Send + 'static,
{
    match ctx.transaction::<StagedWrites>() {
        Some(staged) => {
            staged.stage_checked(check);
            Ok(())
        }
        None => check().map(|write| write()),
    }
}

/// In-memory unit of work. Collaborators stage their writes on the
/// transaction carried by the context; the writes are checked and applied
/// under a commit lock only when the body succeeds and the request is still
/// live.
///
/// Reads made inside the body do not observe staged writes. A check that
/// fails at commit, as a uniqueness rule broken by a concurrent commit
/// would, rolls the unit of work back.
#[derive(Debug, Default)]
pub struct StagedUnitOfWork {
    commit_lock: Mutex<()>,
}

impl StagedUnitOfWork {
    /// Creates a new in-memory unit of work.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn commit(&self, staged: &StagedWrites) -> Result<usize, InfrastructureError> {
        let _commit = self.commit_lock.lock();
        staged.apply()
    }
}

#[async_trait]
impl UnitOfWork for StagedUnitOfWork {
    async fn run<'a>(
        &self,
        ctx: &RequestContext,
        work: Work<'a>,
    ) -> Result<(), InfrastructureError> {
        if ctx.in_transaction() {
            return Err(InfrastructureError::NestedUnitOfWork);
        }
        ctx.ensure_active()?;

        let staged = Arc::new(StagedWrites::default());
        let result = ctx
            .guard(work(ctx.with_transaction(Arc::clone(&staged))))
            .await;

        let committed = result
            .and_then(|()| ctx.ensure_active())
            .and_then(|()| self.commit(&staged));
        match committed {
            Ok(applied) => {
                debug!(correlation_id = %ctx.correlation_id(), applied, "unit of work committed");
                Ok(())
            }
            Err(err) => {
                debug!(
                    correlation_id = %ctx.correlation_id(),
                    discarded = staged.len(),
                    error = %err,
                    "unit of work rolled back"
                );
                Err(err)
            }
        }
    }
}
