//! Collaborator contracts for race persistence.

use async_trait::async_trait;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;

use crate::domain::aggregates::Race;
use crate::domain::values::RaceId;

/// Read access to races.
#[async_trait]
pub trait RacesGetter: Send + Sync {
    /// Loads a race. `Ok(None)` means no such race.
    async fn by_id(
        &self,
        ctx: &RequestContext,
        id: RaceId,
    ) -> Result<Option<Race>, InfrastructureError>;

    /// Lists every race, ordered by date then name.
    async fn all(&self, ctx: &RequestContext) -> Result<Vec<Race>, InfrastructureError>;
}

/// Read/write access to races.
#[async_trait]
pub trait RacesRepository: RacesGetter {
    /// Returns `true` if a race with the candidate's name and date exists.
    /// The candidate's id is ignored.
    async fn exists(&self, ctx: &RequestContext, candidate: &Race)
    -> Result<bool, InfrastructureError>;

    /// Inserts or replaces a race with its competitors. Joins the transaction
    /// carried by `ctx`.
    async fn save(&self, ctx: &RequestContext, race: &Race) -> Result<(), InfrastructureError>;
}
