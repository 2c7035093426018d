use axum::routing::post;
use axum::Router;

use crate::handlers::databases;
use crate::state::AppState;

/// Routes mounted at `/v1/databases`.
///
/// ```text
/// POST /users    -> create_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/users", post(databases::create_user))
}
