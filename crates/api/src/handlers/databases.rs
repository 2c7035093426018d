//! Handler for tenant database user provisioning.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use q8_core::database::DatabaseUserRequest;
use serde::Serialize;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DatabaseUserResponse {
    pub status: &'static str,
}

/// POST /v1/databases/users
///
/// Create the tenant's database user with `readWrite` on its database, or
/// reset the password when the user already exists.
pub async fn create_user(
    State(state): State<AppState>,
    _: RequireAdmin,
    AppJson(input): AppJson<DatabaseUserRequest>,
) -> AppResult<(StatusCode, Json<DatabaseUserResponse>)> {
    state.orchestrator.create_database_user(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DatabaseUserResponse {
            status: "database_configured",
        }),
    ))
}
