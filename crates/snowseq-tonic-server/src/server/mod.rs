//! Server-side components of the `snowseq` gRPC service.
//!
//! ## Submodules
//!
//! - [`config`] - CLI and environment configuration.
//! - [`service`] - gRPC service implementation.
//! - [`store`] - The coordination store selected at startup.
//! - [`telemetry`] - Logging, tracing and metrics initialization.

pub mod config;
pub mod service;
pub mod store;
pub mod telemetry;
