//! Handlers for tenant lifecycle endpoints.

use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use q8_core::compose::executor::DEFAULT_LOG_TAIL;
use q8_core::error::CoreError;
use q8_core::tenant::{ProvisionPayload, TenantIdentity};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for the provision endpoint.
///
/// Missing fields deserialize as empty so they are reported as a 400.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProvisionRequest {
    pub id: String,
    pub subdomain: String,
    pub compose_content: String,
    pub env_content: String,
}

#[derive(Debug, Serialize)]
pub struct ProvisionResponse {
    pub status: &'static str,
    pub id: String,
}

/// Response for actions addressed by subdomain.
#[derive(Debug, Serialize)]
pub struct TenantActionResponse {
    pub status: &'static str,
    pub subdomain: String,
}

/// Query parameters for the logs endpoint.
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    /// Number of lines; kept as a string so bad values fall back to the default.
    pub tail: Option<String>,
}

/// Parse the `tail` query value, defaulting to [`DEFAULT_LOG_TAIL`].
pub fn parse_tail(raw: Option<&str>) -> u32 {
    raw.and_then(|t| t.trim().parse().ok())
        .unwrap_or(DEFAULT_LOG_TAIL)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/tenants/provision
///
/// Write the tenant's configuration and bring its containers up.
pub async fn provision(
    State(state): State<AppState>,
    _: RequireAdmin,
    AppJson(input): AppJson<ProvisionRequest>,
) -> AppResult<(StatusCode, Json<ProvisionResponse>)> {
    if input.id.trim().is_empty() || input.subdomain.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Missing required fields (id, subdomain)".to_string(),
        )));
    }

    let identity = TenantIdentity {
        id: input.id,
        subdomain: input.subdomain,
    };
    let payload = ProvisionPayload {
        compose_content: input.compose_content,
        env_content: input.env_content,
    };

    state.orchestrator.provision(&identity, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProvisionResponse {
            status: "provisioned",
            id: identity.id,
        }),
    ))
}

/// POST /v1/tenants/teardown/{subdomain}
///
/// Stop the tenant's containers and archive its directory.
pub async fn teardown(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(subdomain): Path<String>,
) -> AppResult<Json<TenantActionResponse>> {
    state.orchestrator.teardown(&subdomain).await?;
    Ok(Json(TenantActionResponse {
        status: "torn_down",
        subdomain,
    }))
}

/// POST /v1/tenants/restart/{subdomain}
pub async fn restart(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(subdomain): Path<String>,
) -> AppResult<Json<TenantActionResponse>> {
    state.orchestrator.restart(&subdomain).await?;
    Ok(Json(TenantActionResponse {
        status: "restarted",
        subdomain,
    }))
}

/// GET /v1/tenants/status/{subdomain}
///
/// Raw `docker compose ps` JSON lines.
pub async fn status(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(subdomain): Path<String>,
) -> AppResult<impl IntoResponse> {
    let body = state.orchestrator.status(&subdomain).await?;
    Ok(([(CONTENT_TYPE, "application/json")], body))
}

/// GET /v1/tenants/logs/{subdomain}?tail=N
pub async fn logs(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(subdomain): Path<String>,
    Query(query): Query<LogsQuery>,
) -> AppResult<impl IntoResponse> {
    let tail = parse_tail(query.tail.as_deref());
    let body = state.orchestrator.logs(&subdomain, tail).await?;
    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}

/// GET /v1/tenants/images/{subdomain}
pub async fn images(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(subdomain): Path<String>,
) -> AppResult<impl IntoResponse> {
    let body = state.orchestrator.images(&subdomain).await?;
    Ok(([(CONTENT_TYPE, "application/json")], body))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
