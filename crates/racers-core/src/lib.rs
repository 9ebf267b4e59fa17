//! Racers Core: shared domain abstractions.
//!
//! This crate defines the identifier, event envelope, aggregate event queue,
//! error taxonomy and transactional seams that every bounded context depends
//! on. It contains no storage code.

pub mod aggregate;
pub mod clock;
pub mod context;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod id;
pub mod unit_of_work;
pub mod validation;
