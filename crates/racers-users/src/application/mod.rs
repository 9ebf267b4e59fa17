//! Application layer: collaborator contracts and the users service.

pub mod repository;
pub mod service;
