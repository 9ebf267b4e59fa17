//! Commands for the Races context.

use chrono::{DateTime, Utc};

/// Command to create a race.
#[derive(Debug, Clone)]
pub struct CreateRace {
    /// Requested race id, canonical UUID form.
    pub id: String,
    /// Race name.
    pub name: String,
    /// When the race takes place.
    pub date: DateTime<Utc>,
    /// Id of the owning user.
    pub owner_id: String,
}

/// Command to join a race as a competitor.
#[derive(Debug, Clone)]
pub struct JoinRace {
    /// The race to join.
    pub race_id: String,
    /// The joining user.
    pub user_id: String,
}
