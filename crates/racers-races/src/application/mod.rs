//! Application layer: collaborator contracts and the races service.

pub mod repository;
pub mod service;
