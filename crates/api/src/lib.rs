//! HTTP API: configuration, routing, and the authentication middleware.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
