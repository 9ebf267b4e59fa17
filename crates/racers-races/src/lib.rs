//! Racers: Races bounded context.
//!
//! Responsible for race creation, uniqueness by name and date, and the
//! competitor roster.

pub mod application;
pub mod domain;
pub mod infrastructure;
