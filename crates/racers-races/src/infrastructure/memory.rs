//! In-memory race store.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_core::unit_of_work::stage_checked_or_apply;

use crate::application::repository::{RacesGetter, RacesRepository};
use crate::domain::aggregates::{Race, RaceOptions};
use crate::domain::values::RaceId;

/// Race repository backed by a shared map. Writes made under a staged unit
/// of work become visible on commit.
///
/// Saving adds competitors to the stored race instead of replacing them, and
/// a commit is rejected when another race already holds the same name and
/// date. Both hold against commits that landed after the race was read.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRacesRepository {
    races: Arc<RwLock<HashMap<RaceId, Race>>>,
}

impl InMemoryRacesRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a snapshot of `race` immediately, bypassing any unit of work.
    pub fn insert(&self, race: &Race) {
        self.races.write().insert(race.id(), race.snapshot());
    }

    /// Number of stored races.
    #[must_use]
    pub fn len(&self) -> usize {
        self.races.read().len()
    }

    /// Returns `true` if no race is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.races.read().is_empty()
    }
}

#[async_trait]
impl RacesGetter for InMemoryRacesRepository {
    async fn by_id(
        &self,
        ctx: &RequestContext,
        id: RaceId,
    ) -> Result<Option<Race>, InfrastructureError> {
        ctx.ensure_active()?;
        Ok(self.races.read().get(&id).map(Race::snapshot))
    }

    async fn all(&self, ctx: &RequestContext) -> Result<Vec<Race>, InfrastructureError> {
        ctx.ensure_active()?;
        let mut races: Vec<Race> = self.races.read().values().map(Race::snapshot).collect();
        races.sort_by(|a, b| {
            a.date()
                .cmp(&b.date())
                .then_with(|| a.name().as_str().cmp(b.name().as_str()))
        });
        Ok(races)
    }
}

#[async_trait]
impl RacesRepository for InMemoryRacesRepository {
    async fn exists(
        &self,
        ctx: &RequestContext,
        candidate: &Race,
    ) -> Result<bool, InfrastructureError> {
        ctx.ensure_active()?;
        Ok(self
            .races
            .read()
            .values()
            .any(|race| race.name() == candidate.name() && race.date() == candidate.date()))
    }

    async fn save(&self, ctx: &RequestContext, race: &Race) -> Result<(), InfrastructureError> {
        ctx.ensure_active()?;
        let incoming = race.snapshot();
        let races = Arc::clone(&self.races);
        stage_checked_or_apply(ctx, move || {
            let clash = races
                .read()
                .values()
                .find(|stored| {
                    stored.id() != incoming.id()
                        && stored.name() == incoming.name()
                        && stored.date() == incoming.date()
                })
                .map(Race::id);
            if let Some(existing) = clash {
                return Err(InfrastructureError::Infrastructure(format!(
                    "race {existing} already holds {} on {}",
                    incoming.name(),
                    incoming.date()
                )));
            }
            Ok(move || {
                let mut races = races.write();
                let merged = match races.get(&incoming.id()) {
                    Some(stored) => merge(stored, &incoming),
                    None => incoming,
                };
                races.insert(merged.id(), merged);
            })
        })
    }
}

/// `incoming`'s fields with the competitors of both races.
fn merge(stored: &Race, incoming: &Race) -> Race {
    let competitors: BTreeSet<_> = stored
        .competitors()
        .union(incoming.competitors())
        .copied()
        .collect();
    Race::new(
        incoming.id(),
        incoming.name().clone(),
        incoming.date(),
        incoming.owner(),
        RaceOptions { competitors },
    )
}
