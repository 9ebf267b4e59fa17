//! Validated value objects for teams.

use std::fmt;

use racers_core::id::Id;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(Id);

impl TeamId {
    /// Parses a team id from its canonical string form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTeamIdError` if `s` is not a valid identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidTeamIdError> {
        Id::parse(s).map(Self).map_err(|source| InvalidTeamIdError {
            input: s.to_owned(),
            source,
        })
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_id(&self) -> Id {
        self.0
    }
}

impl From<Id> for TeamId {
    fn from(id: Id) -> Self {
        Self(id)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The given string is not a valid team id.
#[derive(Debug, Error)]
#[error("invalid team id {input:?}: {source}")]
pub struct InvalidTeamIdError {
    /// The rejected input.
    pub input: String,
    /// Why parsing failed.
    #[source]
    pub source: uuid::Error,
}

/// Non-empty team name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamName(String);

impl TeamName {
    /// Validates a team name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTeamNameError` if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidTeamNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidTeamNameError);
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TeamName {
    type Error = InvalidTeamNameError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<TeamName> for String {
    fn from(name: TeamName) -> Self {
        name.0
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The given team name is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid team name: empty name")]
pub struct InvalidTeamNameError;
