pub mod databases;
pub mod health;
pub mod tenants;

use axum::Router;

use crate::state::AppState;

/// Build the `/v1` route tree.
///
/// ```text
/// /tenants/provision                 provision (POST)
/// /tenants/teardown/{subdomain}      teardown (POST)
/// /tenants/restart/{subdomain}       restart (POST)
/// /tenants/status/{subdomain}        container status (GET)
/// /tenants/logs/{subdomain}          container logs (GET, ?tail=N)
/// /tenants/images/{subdomain}        image metadata (GET)
///
/// /databases/users                   create or reset a database user (POST)
/// ```
pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/tenants", tenants::router())
        .nest("/databases", databases::router())
}
