//! Route modules organized by bounded context.

pub mod health;
pub mod races;
pub mod teams;
pub mod users;
