//! In-memory user store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_core::unit_of_work::stage_or_apply;

use crate::application::repository::{UsersGetter, UsersRepository};
use crate::domain::aggregates::User;
use crate::domain::values::UserId;

/// User repository backed by a shared map. Writes made under a staged unit
/// of work become visible on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUsersRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUsersRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `user` immediately, bypassing any unit of work. Pending events
    /// are not kept.
    pub fn insert(&self, user: User) {
        let snapshot = User::new(user.id(), user.name().clone());
        self.users.write().insert(snapshot.id(), snapshot);
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns `true` if no user is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UsersGetter for InMemoryUsersRepository {
    async fn get(
        &self,
        ctx: &RequestContext,
        id: UserId,
    ) -> Result<Option<User>, InfrastructureError> {
        ctx.ensure_active()?;
        Ok(self.users.read().get(&id).cloned())
    }
}

#[async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn save(&self, ctx: &RequestContext, user: &User) -> Result<(), InfrastructureError> {
        ctx.ensure_active()?;
        let snapshot = User::new(user.id(), user.name().clone());
        let users = Arc::clone(&self.users);
        stage_or_apply(ctx, move || {
            users.write().insert(snapshot.id(), snapshot);
        });
        Ok(())
    }
}
