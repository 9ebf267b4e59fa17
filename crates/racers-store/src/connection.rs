//! Connection selection shared by the repositories.

use std::fmt;

use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::OwnedMutexGuard;
use tracing::error;

use crate::unit_of_work::PgTransaction;

/// A connection borrowed for one repository call: either the transaction
/// installed on the context or a pooled connection.
pub(crate) enum Connection {
    Transaction(OwnedMutexGuard<Option<Transaction<'static, Postgres>>>),
    Pool(PoolConnection<Postgres>),
}

impl Connection {
    /// Picks the context's transaction if there is one.
    pub(crate) async fn acquire(
        ctx: &RequestContext,
        pool: &PgPool,
    ) -> Result<Self, InfrastructureError> {
        ctx.ensure_active()?;
        match ctx.transaction::<PgTransaction>() {
            Some(tx) => Ok(Self::Transaction(tx.lock().await)),
            None => ctx
                .guard(async {
                    pool.acquire()
                        .await
                        .map_err(database("acquiring connection"))
                })
                .await
                .map(Self::Pool),
        }
    }

    pub(crate) fn get(&mut self) -> Result<&mut PgConnection, InfrastructureError> {
        match self {
            Self::Transaction(guard) => Option::as_mut(&mut **guard)
                .map(|tx| &mut **tx)
                .ok_or_else(|| {
                    InfrastructureError::Infrastructure("transaction already finished".into())
                }),
            Self::Pool(conn) => Ok(&mut **conn),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction(_) => f.write_str("Connection::Transaction"),
            Self::Pool(_) => f.write_str("Connection::Pool"),
        }
    }
}

/// Wraps a database failure raised while doing `operation`. The detail is
/// logged here and kept in the error for server-side diagnostics only.
pub(crate) fn database(operation: &'static str) -> impl FnOnce(sqlx::Error) -> InfrastructureError {
    move |err| {
        error!(operation, error = %err, "database call failed");
        InfrastructureError::Infrastructure(format!("{operation}: {err}"))
    }
}

/// A stored row no longer satisfies the domain's validation.
pub(crate) fn corrupt_row(table: &'static str, detail: impl fmt::Display) -> InfrastructureError {
    error!(table, %detail, "stored row failed validation");
    InfrastructureError::Infrastructure(format!("corrupt row in {table}: {detail}"))
}
