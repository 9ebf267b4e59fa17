//! Validated value objects for users.

use std::fmt;

use racers_core::id::Id;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Id);

impl UserId {
    /// Parses a user id from its canonical string form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUserIdError` if `s` is not a valid identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidUserIdError> {
        Id::parse(s).map(Self).map_err(|source| InvalidUserIdError {
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

impl From<Id> for UserId {
    fn from(id: Id) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The given string is not a valid user id.
#[derive(Debug, Error)]
#[error("invalid user id {input:?}: {source}")]
pub struct InvalidUserIdError {
    /// The rejected input.
    pub input: String,
    /// Why parsing failed.
    #[source]
    pub source: uuid::Error,
}

/// Non-empty display name of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Validates a user name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUserNameError` if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidUserNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidUserNameError);
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = InvalidUserNameError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The given user name is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid user name: empty name")]
pub struct InvalidUserNameError;
