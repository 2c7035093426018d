use std::sync::Arc;

use crate::config::AgentConfig;
use crate::orchestration::TenantOrchestrator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Agent configuration (admin token is read by the auth extractor).
    pub config: Arc<AgentConfig>,
    /// Tenant lifecycle orchestrator.
    pub orchestrator: Arc<TenantOrchestrator>,
}
