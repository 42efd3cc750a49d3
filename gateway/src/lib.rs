//! Smart-home sensor gateway.
//!
//! Each sensor operation is served either by the local PostgreSQL store or by
//! one of the external sensors, state-monitoring and temperature services,
//! depending on a routing flag fixed at startup. Whatever the backend, callers
//! see the same payloads and the same `{error, status_code}` error contract.

pub mod backend;
pub mod clients;
pub mod config;
pub mod db;
pub mod enrich;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod rest;
pub mod routing;
pub mod service;
pub mod validate;
