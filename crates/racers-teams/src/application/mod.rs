//! Application layer: collaborator contracts and the teams service.

pub mod repository;
pub mod service;
