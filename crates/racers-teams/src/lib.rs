//! Racers: Teams bounded context.
//!
//! Responsible for team creation and membership. A user belongs to at most
//! one team; that rule spans teams, so `TeamsService` checks it against the
//! repository before every join.

pub mod application;
pub mod domain;
pub mod infrastructure;
