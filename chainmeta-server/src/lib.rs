//! HTTP server for chainmeta lookups.
//!
//! Wires the provider chains from `chainmeta`, `chainmeta-http` and
//! `chainmeta-evm` into an Axum router according to a TOML configuration.
//!
//! # Modules
//!
//! - [`config`] - Server configuration with environment variable expansion
//! - [`state`] - Provider chain assembly
//! - [`handlers`] - Axum route handlers and router builder
//! - [`error`] - JSON error responses

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use handlers::router;
pub use state::{AppState, SharedState};
