//! q8 agent library.
//!
//! Exposes configuration, state, error handling, the orchestrator and the
//! routes so integration tests and the binary entrypoint share them.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod orchestration;
pub mod router;
pub mod routes;
pub mod state;
