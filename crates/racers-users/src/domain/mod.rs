//! User domain model.

pub mod aggregates;
pub mod commands;
pub mod errors;
pub mod events;
pub mod values;
