#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use q8_agent::config::{AgentConfig, MongoAdminConfig};
use q8_agent::orchestration::TenantOrchestrator;
use q8_agent::router::build_app_router;
use q8_agent::state::AppState;
use q8_core::compose::{CommandExecutor, CommandOutput, ComposeCommand, ExecError, ProjectScope};
use tower::ServiceExt;

pub const TEST_TOKEN: &str = "test-admin-token";

/// Build a test `AgentConfig` rooted at `tenants_root`.
pub fn test_config(tenants_root: &Path) -> AgentConfig {
    AgentConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_token: TEST_TOKEN.to_string(),
        tenants_root: tenants_root.to_path_buf(),
        project_prefix: "q8-".to_string(),
        docker_bin: "docker".to_string(),
        command_timeout_secs: 30,
        request_timeout_secs: 30,
        shutdown_grace_secs: 1,
        mongo: MongoAdminConfig {
            host: "127.0.0.1".to_string(),
            port: 27017,
            user: "root".to_string(),
            password: "rootpw".to_string(),
            image: "mongo:latest".to_string(),
        },
    }
}

/// Build the full application router over `executor`, using the same
/// middleware stack as production.
pub fn build_test_app(tenants_root: &Path, executor: Arc<RecordingExecutor>) -> Router {
    let config = test_config(tenants_root);
    let orchestrator = TenantOrchestrator::new(&config, executor);
    let state = AppState {
        config: Arc::new(config.clone()),
        orchestrator: Arc::new(orchestrator),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Recording executor
// ---------------------------------------------------------------------------

/// One compose invocation seen by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeCall {
    pub project: String,
    pub working_dir: PathBuf,
    pub command: ComposeCommand,
}

/// How a scripted command should fail.
#[derive(Debug, Clone)]
pub enum Failure {
    Exit { code: i32, output: String },
    Timeout,
}

impl Failure {
    pub fn exit(code: i32, output: &str) -> Self {
        Self::Exit {
            code,
            output: output.to_string(),
        }
    }

    fn into_result(self) -> Result<CommandOutput, ExecError> {
        match self {
            Self::Exit { code, output } => Ok(CommandOutput {
                output,
                exit_code: code,
                success: false,
                duration_ms: 1,
            }),
            Self::Timeout => Err(ExecError::Timeout {
                timeout: std::time::Duration::from_secs(30),
            }),
        }
    }
}

/// Executor double that records every call and answers from a script.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<ComposeCall>>,
    scripts: Mutex<Vec<(String, String)>>,
    failures: Mutex<HashMap<&'static str, Failure>>,
    outputs: Mutex<HashMap<&'static str, String>>,
    script_failure: Mutex<Option<Failure>>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every invocation of the named compose command fail.
    pub fn fail_on(&self, command: &'static str, failure: Failure) {
        self.failures.lock().unwrap().insert(command, failure);
    }

    /// Output returned by a successful invocation of the named command.
    pub fn respond(&self, command: &'static str, output: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(command, output.to_string());
    }

    pub fn fail_admin_script(&self, failure: Failure) {
        *self.script_failure.lock().unwrap() = Some(failure);
    }

    pub fn calls(&self) -> Vec<ComposeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<ComposeCommand> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    /// `(target, script)` pairs passed to `admin_script`.
    pub fn scripts(&self) -> Vec<(String, String)> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn compose(
        &self,
        scope: &ProjectScope,
        command: ComposeCommand,
    ) -> Result<CommandOutput, ExecError> {
        self.calls.lock().unwrap().push(ComposeCall {
            project: scope.project.clone(),
            working_dir: scope.working_dir.clone(),
            command,
        });

        if let Some(failure) = self.failures.lock().unwrap().get(command.name()).cloned() {
            return failure.into_result();
        }

        let output = self
            .outputs
            .lock()
            .unwrap()
            .get(command.name())
            .cloned()
            .unwrap_or_default();
        Ok(CommandOutput {
            output,
            exit_code: 0,
            success: true,
            duration_ms: 1,
        })
    }

    async fn admin_script(&self, target: &str, script: &str) -> Result<CommandOutput, ExecError> {
        self.scripts
            .lock()
            .unwrap()
            .push((target.to_string(), script.to_string()));

        if let Some(failure) = self.script_failure.lock().unwrap().clone() {
            return failure.into_result();
        }
        Ok(CommandOutput {
            output: "User created successfully\n".to_string(),
            exit_code: 0,
            success: true,
            duration_ms: 1,
        })
    }

    async fn is_available(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

/// GET without an `Authorization` header.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

/// GET with the test admin token.
pub async fn get_auth(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST a JSON body with an arbitrary `Authorization` header value.
pub async fn post_json_with(
    app: Router,
    uri: &str,
    authorization: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    send(app, request).await
}

/// POST a JSON body with the test admin token.
pub async fn post_json_auth(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let auth = format!("Bearer {TEST_TOKEN}");
    post_json_with(app, uri, Some(&auth), body).await
}

/// POST a raw body with the test admin token and an optional content type.
pub async fn post_raw_auth(
    app: Router,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {TEST_TOKEN}"));
    if let Some(value) = content_type {
        builder = builder.header(CONTENT_TYPE, value);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    send(app, request).await
}

/// POST with an empty body and the test admin token.
pub async fn post_auth(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Directory entries directly under `root`, sorted.
pub fn list_dir(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Provision request body for `subdomain`.
pub fn provision_body(id: &str, subdomain: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "subdomain": subdomain,
        "compose_content": "services:\n  app:\n    image: nginx:alpine\n",
        "env_content": "TENANT=acme\nPORT=8080\n",
    })
}
