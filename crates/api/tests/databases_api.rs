//! HTTP-level integration tests for database user provisioning.

mod common;

use axum::http::StatusCode;
use common::{body_json, post_json_auth, post_raw_auth, Failure, RecordingExecutor};
use serde_json::json;

fn user_body() -> serde_json::Value {
    json!({
        "database_name": "acme_db",
        "new_user": "acme",
        "new_password": "s3cret",
    })
}

#[tokio::test]
async fn create_user_runs_script_against_configured_host() {
    let root = tempfile::tempdir().unwrap();
    let executor = RecordingExecutor::new();
    let app = common::build_test_app(root.path(), executor.clone());

    let response = post_json_auth(app, "/v1/databases/users", user_body()).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["status"], "database_configured");

    let scripts = executor.scripts();
    assert_eq!(scripts.len(), 1);
    let (target, script) = &scripts[0];
    assert_eq!(target, "127.0.0.1:27017");
    assert!(script.contains(r#"db.auth("root", "rootpw");"#));
    assert!(script.contains(r#"user: "acme","#));
    assert!(script.contains("e.code === 51003"));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn script_failure_is_reported() {
    let root = tempfile::tempdir().unwrap();
    let executor = RecordingExecutor::new();
    executor.fail_admin_script(Failure::exit(1, "MongoServerError: Authentication failed."));
    let app = common::build_test_app(root.path(), executor.clone());

    let response = post_json_auth(app, "/v1/databases/users", user_body()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ORCHESTRATION_FAILED");
    assert_eq!(
        json["error"],
        "mongo execution failed: MongoServerError: Authentication failed.: exit status 1"
    );
}

#[tokio::test]
async fn missing_fields_are_rejected_before_execution() {
    let root = tempfile::tempdir().unwrap();
    let executor = RecordingExecutor::new();
    let app = common::build_test_app(root.path(), executor.clone());

    let response = post_json_auth(
        app,
        "/v1/databases/users",
        json!({ "database_name": "acme_db" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Missing required fields (new_user, new_password)");
    assert!(executor.scripts().is_empty());
}

#[tokio::test]
async fn mistyped_body_is_a_json_400() {
    let root = tempfile::tempdir().unwrap();
    let executor = RecordingExecutor::new();
    let app = common::build_test_app(root.path(), executor.clone());

    let response = post_raw_auth(
        app,
        "/v1/databases/users",
        Some("application/json"),
        r#"{"database_name":["acme_db"],"new_user":"acme","new_password":"s3cret"}"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    assert!(executor.scripts().is_empty());
}
