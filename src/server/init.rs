//! Server initialization
//!
//! Wires the registries, worker pool and engines together, builds the
//! router and runs it until a shutdown signal arrives.

use anyhow::{Context, Result};
use axum::extract::Extension;
use axum::http::HeaderValue;
use axum::Router;
use serde_json::json;
use serverguard_core::{
    wait_for_shutdown_signal, AuthGate, ConnectionRegistry, ScreenEngine, SessionRegistry,
    ShutdownController, TerminalEngine, WorkerPool,
};
use serverguard_desktop::{build_backends, DesktopBackends};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::config::AppConfig;
use super::validation::validate_production_config;
use crate::api::{api_router, CommandRunner};
use crate::websocket::websocket_router;

/// Shared components handed to handlers as extensions
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthGate>,
    pub sessions: Arc<SessionRegistry>,
    pub connections: Arc<ConnectionRegistry>,
    pub pool: Arc<WorkerPool>,
    pub terminal: Arc<TerminalEngine>,
    pub screen: Arc<ScreenEngine>,
    pub commands: Arc<CommandRunner>,
    pub shutdown: Arc<ShutdownController>,
}

impl Services {
    /// Build every component from configuration
    pub fn new(config: &AppConfig, desktop: DesktopBackends) -> Self {
        let shutdown = ShutdownController::new();
        let sessions = Arc::new(SessionRegistry::new());
        let connections = Arc::new(ConnectionRegistry::new());
        let pool = Arc::new(WorkerPool::from_config(&config.pool));

        let terminal = TerminalEngine::new(sessions.clone(), connections.clone(), &config.terminal)
            .with_shutdown(shutdown.token());
        let screen = ScreenEngine::new(
            sessions.clone(),
            connections.clone(),
            pool.clone(),
            desktop.capturer,
            desktop.injector,
            &config.screen.engine,
        )
        .with_shutdown(shutdown.token());

        Self {
            auth: Arc::new(AuthGate::new(config.auth.clone())),
            sessions,
            connections,
            pool,
            terminal: Arc::new(terminal),
            screen: Arc::new(screen),
            commands: Arc::new(CommandRunner::from_config(config)),
            shutdown,
        }
    }

    /// Replace the HTTP command runner
    #[must_use]
    pub fn with_command_runner(mut self, runner: CommandRunner) -> Self {
        self.commands = Arc::new(runner);
        self
    }
}

/// Build the full application router
pub fn build_router(services: &Services, config: &AppConfig) -> Router {
    Router::new()
        .merge(api_router())
        .merge(websocket_router())
        .layer(Extension(services.auth.clone()))
        .layer(Extension(services.sessions.clone()))
        .layer(Extension(services.connections.clone()))
        .layer(Extension(services.pool.clone()))
        .layer(Extension(services.terminal.clone()))
        .layer(Extension(services.screen.clone()))
        .layer(Extension(services.commands.clone()))
        .layer(Extension(services.shutdown.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Run the server
pub async fn run(config: AppConfig) -> Result<()> {
    info!("Starting ServerGuard v{}", env!("CARGO_PKG_VERSION"));
    validate_production_config(&config);

    let desktop = build_backends(&config.screen.desktop).context("Failed to set up desktop backend")?;
    let services = Services::new(&config, desktop);
    info!(
        workers = services.pool.workers(),
        shell = %config.terminal.shell_spec().program,
        "Session engines ready"
    );

    let app = build_router(&services, &config);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(services.clone()))
        .await
        .context("HTTP server error")?;

    info!("ServerGuard shutdown complete");
    Ok(())
}

/// Resolves once the process is asked to stop and sessions have drained
async fn shutdown_signal(services: Services) {
    wait_for_shutdown_signal().await;
    info!("Shutdown signal received, notifying clients");

    match services
        .connections
        .broadcast(&json!({"type": "system", "message": "Server shutting down"}))
        .await
    {
        Ok(delivered) => info!(delivered, "Shutdown notice broadcast"),
        Err(e) => warn!(error = %e, "Shutdown broadcast failed"),
    }

    services.shutdown.shutdown().await;
}
