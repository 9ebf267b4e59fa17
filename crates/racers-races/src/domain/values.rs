//! Validated value objects for races.

use std::fmt;

use chrono::{DateTime, Utc};
use racers_core::clock::Clock;
use racers_core::id::Id;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceId(Id);

impl RaceId {
    /// Parses a race id from its canonical string form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRaceIdError` if `s` is not a valid identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidRaceIdError> {
        Id::parse(s).map(Self).map_err(|source| InvalidRaceIdError {
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

impl From<Id> for RaceId {
    fn from(id: Id) -> Self {
        Self(id)
    }
}

impl fmt::Display for RaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The given string is not a valid race id.
#[derive(Debug, Error)]
#[error("invalid race id {input:?}: {source}")]
pub struct InvalidRaceIdError {
    /// The rejected input.
    pub input: String,
    /// Why parsing failed.
    #[source]
    pub source: uuid::Error,
}

/// Non-empty race name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RaceName(String);

impl RaceName {
    /// Validates a race name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRaceNameError` if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidRaceNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidRaceNameError);
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RaceName {
    type Error = InvalidRaceNameError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<RaceName> for String {
    fn from(name: RaceName) -> Self {
        name.0
    }
}

impl fmt::Display for RaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The given race name is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid race name: empty name")]
pub struct InvalidRaceNameError;

/// Date on which a race takes place.
///
/// Checked against the clock only when first validated; stored races keep
/// their date even after it has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceDate(DateTime<Utc>);

impl RaceDate {
    /// Validates that `date` is not strictly before the clock's now.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRaceDateError` if `date` is in the past.
    pub fn new(date: DateTime<Utc>, clock: &dyn Clock) -> Result<Self, InvalidRaceDateError> {
        if date < clock.now() {
            return Err(InvalidRaceDateError { rejected: date });
        }
        Ok(Self(date))
    }

    /// Rebuilds a date read from storage without re-validating it.
    #[must_use]
    pub fn restore(date: DateTime<Utc>) -> Self {
        Self(date)
    }

    /// Returns the timestamp.
    #[must_use]
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for RaceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.to_rfc3339().fmt(f)
    }
}

/// The given race date lies in the past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("race date cannot be in the past: {rejected}")]
pub struct InvalidRaceDateError {
    /// The rejected date.
    pub rejected: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use racers_test_support::FixedClock;

    use super::*;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    #[test]
    fn test_race_id_rejects_empty() {
        let err = RaceId::parse("").unwrap_err();

        assert_eq!(err.input, "");
    }

    #[test]
    fn test_race_name_rejects_empty() {
        assert_eq!(RaceName::new(""), Err(InvalidRaceNameError));
    }

    #[test]
    fn test_race_name_round_trips() {
        assert_eq!(RaceName::new("Boston").unwrap().as_str(), "Boston");
    }

    #[test]
    fn test_race_date_rejects_past() {
        let clock = clock();
        let past = clock.0 - Duration::seconds(1);

        assert_eq!(
            RaceDate::new(past, &clock),
            Err(InvalidRaceDateError { rejected: past })
        );
    }

    #[test]
    fn test_race_date_accepts_now_and_later() {
        let clock = clock();
        let later = clock.0 + Duration::days(30);

        assert_eq!(RaceDate::new(clock.0, &clock).unwrap().as_datetime(), clock.0);
        assert_eq!(RaceDate::new(later, &clock).unwrap().as_datetime(), later);
    }

    #[test]
    fn test_restore_skips_validation() {
        let clock = clock();
        let past = clock.0 - Duration::days(365);

        assert_eq!(RaceDate::restore(past).as_datetime(), past);
    }

    #[test]
    fn test_race_name_deserializes_through_validation() {
        let empty = serde_json::from_str::<RaceName>("\"\"");
        let named = serde_json::from_str::<RaceName>("\"Harriers\"").unwrap();

        assert!(empty.is_err());
        assert_eq!(named.as_str(), "Harriers");
        assert_eq!(serde_json::to_string(&named).unwrap(), "\"Harriers\"");
    }
}
