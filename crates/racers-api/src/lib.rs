//! Racers API library: HTTP routes, request context and application state.

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod telemetry;
