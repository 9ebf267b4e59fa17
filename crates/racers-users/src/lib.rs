//! Racers: Users bounded context.
//!
//! Owns user identity and naming. Races and teams reference users by
//! `UserId` and resolve them through `UsersGetter`.

pub mod application;
pub mod domain;
pub mod infrastructure;
