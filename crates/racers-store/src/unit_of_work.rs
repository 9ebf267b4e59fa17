//! Serializable PostgreSQL unit of work.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_core::unit_of_work::{UnitOfWork, Work};
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

use crate::connection::database;

/// The open transaction a [`PgUnitOfWork`] installs on the context.
///
/// Repositories lock it for the duration of one call, so calls made under
/// the same unit of work are serialised.
pub struct PgTransaction {
    inner: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl PgTransaction {
    fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub(crate) async fn lock(&self) -> OwnedMutexGuard<Option<Transaction<'static, Postgres>>> {
        Arc::clone(&self.inner).lock_owned().await
    }

    async fn take(&self) -> Option<Transaction<'static, Postgres>> {
        self.inner.lock().await.take()
    }
}

impl fmt::Debug for PgTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgTransaction").finish_non_exhaustive()
    }
}

/// Runs each body in one `SERIALIZABLE` transaction: committed when the body
/// succeeds and the request is still live, rolled back otherwise.
#[derive(Debug, Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    /// Creates a unit of work over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self, ctx: &RequestContext) -> Result<PgTransaction, InfrastructureError> {
        ctx.guard(async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(database("beginning transaction"))?;
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                .execute(&mut *tx)
                .await
                .map_err(database("setting isolation level"))?;
            Ok(PgTransaction::new(tx))
        })
        .await
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    #[instrument(skip(self, ctx, work), fields(correlation_id = %ctx.correlation_id()))]
    async fn run<'a>(
        &self,
        ctx: &RequestContext,
        work: Work<'a>,
    ) -> Result<(), InfrastructureError> {
        if ctx.in_transaction() {
            return Err(InfrastructureError::NestedUnitOfWork);
        }
        ctx.ensure_active()?;

        let handle = Arc::new(self.begin(ctx).await?);
        let result = ctx
            .guard(work(ctx.with_transaction(Arc::clone(&handle))))
            .await;

        let Some(tx) = handle.take().await else {
            return Err(InfrastructureError::Infrastructure(
                "transaction already finished".into(),
            ));
        };

        match result.and_then(|()| ctx.ensure_active()) {
            Ok(()) => {
                tx.commit()
                    .await
                    .map_err(database("committing transaction"))?;
                debug!("transaction committed");
                Ok(())
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                debug!(error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}
