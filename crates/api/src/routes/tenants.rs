//! Route definitions for tenant lifecycle endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tenants;
use crate::state::AppState;

/// Routes mounted at `/v1/tenants`.
///
/// All routes require the admin bearer token (enforced by handler extractors).
///
/// ```text
/// POST /provision                 -> provision
/// POST /teardown/{subdomain}      -> teardown
/// POST /restart/{subdomain}       -> restart
/// GET  /status/{subdomain}        -> status
/// GET  /logs/{subdomain}?tail=N   -> logs
/// GET  /images/{subdomain}        -> images
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/provision", post(tenants::provision))
        .route("/teardown/{subdomain}", post(tenants::teardown))
        .route("/restart/{subdomain}", post(tenants::restart))
        .route("/status/{subdomain}", get(tenants::status))
        .route("/logs/{subdomain}", get(tenants::logs))
        .route("/images/{subdomain}", get(tenants::images))
}
