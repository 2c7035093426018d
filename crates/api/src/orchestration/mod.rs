//! Tenant lifecycle orchestration.
//!
//! [`TenantOrchestrator`] sequences directory preparation, configuration
//! writes and compose commands into provision / teardown / restart /
//! inspect operations. Held in [`AppState`](crate::state::AppState) as an
//! `Arc<TenantOrchestrator>`.

pub mod locks;
pub mod orchestrator;

pub use locks::TenantLocks;
pub use orchestrator::{OrchestrationError, TenantOrchestrator};
