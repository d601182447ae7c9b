//! gRPC service implementation.
//!
//! ## Structure
//!
//! - [`config`] - Per-service settings (`ServiceConfig`).
//! - [`handler`] - gRPC service entry point (`IdService`).

pub mod config;
pub mod handler;
