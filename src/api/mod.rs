//! HTTP API layer

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;
