//! Collaborator contracts for user persistence.

use async_trait::async_trait;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;

use crate::domain::aggregates::User;
use crate::domain::values::UserId;

/// Read access to users, used by every context that references them.
#[async_trait]
pub trait UsersGetter: Send + Sync {
    /// Loads a user. `Ok(None)` means no such user.
    async fn get(&self, ctx: &RequestContext, id: UserId)
    -> Result<Option<User>, InfrastructureError>;

    /// Loads the authenticated user the transport placed on `ctx`.
    /// `Ok(None)` when the request is anonymous or the user is unknown.
    async fn current(&self, ctx: &RequestContext) -> Result<Option<User>, InfrastructureError> {
        match ctx.current_user() {
            Some(id) => self.get(ctx, UserId::from(id)).await,
            None => Ok(None),
        }
    }
}

/// Read/write access to users.
#[async_trait]
pub trait UsersRepository: UsersGetter {
    /// Inserts or replaces a user. Joins the transaction carried by `ctx`.
    async fn save(&self, ctx: &RequestContext, user: &User) -> Result<(), InfrastructureError>;
}
