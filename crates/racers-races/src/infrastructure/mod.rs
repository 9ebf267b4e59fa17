//! Collaborator implementations that need no external system.

pub mod memory;
