use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use q8_core::compose::{CommandExecutor, DockerCompose};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use q8_agent::config::{AgentConfig, DEFAULT_ADMIN_TOKEN};
use q8_agent::orchestration::TenantOrchestrator;
use q8_agent::router::build_app_router;
use q8_agent::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // Read before config so config errors are logged in the chosen format.
    let json_logs = std::env::var("Q8_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "q8_agent=info,q8_core=info,tower_http=info".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    // --- Configuration ---
    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        host = %config.host,
        port = config.port,
        tenants_root = %config.tenants_root.display(),
        "Loaded agent configuration",
    );
    if config.admin_token == DEFAULT_ADMIN_TOKEN {
        tracing::warn!("Q8_AGENT_ADMIN_TOKEN is unset; using the placeholder token");
    }

    // --- Command executor ---
    // Cancelled once the shutdown grace period runs out; kills any command
    // still in flight.
    let cancel = CancellationToken::new();
    let executor = DockerCompose::new(config.docker_bin.clone())
        .with_timeout(config.command_timeout())
        .with_admin_image(config.mongo.image.clone())
        .with_cancellation(cancel.child_token());

    if !executor.is_available().await {
        tracing::error!(docker = %config.docker_bin, "docker compose is not installed or accessible");
        return ExitCode::FAILURE;
    }
    tracing::info!("docker compose available");

    // --- App state ---
    let orchestrator = TenantOrchestrator::new(&config, Arc::new(executor));
    let state = AppState {
        config: Arc::new(config.clone()),
        orchestrator: Arc::new(orchestrator),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let host: IpAddr = match config.host.parse() {
        Ok(host) => host,
        Err(e) => {
            tracing::error!(host = %config.host, error = %e, "Invalid Q8_AGENT_HOST address");
            return ExitCode::FAILURE;
        }
    };
    let addr = SocketAddr::new(host, config.port);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%addr, "q8 agent listening");
    tracing::info!(
        "Routes: POST /v1/tenants/provision, POST /v1/tenants/teardown/{{subdomain}}, \
         POST /v1/tenants/restart/{{subdomain}}, GET /v1/tenants/status/{{subdomain}}, \
         GET /v1/tenants/logs/{{subdomain}}, GET /v1/tenants/images/{{subdomain}}, \
         POST /v1/databases/users, GET /health"
    );

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    let shutdown = {
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                tracing::warn!("Shutdown grace period elapsed, cancelling running commands");
                cancel.cancel();
            });
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    cancel.cancel();
    tracing::info!("Graceful shutdown complete");
    ExitCode::SUCCESS
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
