//! Application startup and lifecycle management.

use crate::config::TraceabilityConfig;
use crate::handlers;
use crate::services::{Database, QueueConsumer};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use service_core::error::AppError;
use service_core::middleware::tracing::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state. Built once at startup; handlers never read
/// the environment themselves.
#[derive(Clone)]
pub struct AppState {
    pub config: TraceabilityConfig,
    pub db: Arc<Database>,
}

/// Health check endpoint for Docker/K8s liveness probes.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "service": state.config.service_name,
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed - database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": state.config.service_name,
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Readiness check endpoint for K8s readiness probes.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
    queue: Option<QueueConsumer>,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: TraceabilityConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: TraceabilityConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(
        config: TraceabilityConfig,
        run_migrations: bool,
    ) -> Result<Self, AppError> {
        let db = Database::connect(&config.database).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let queue = QueueConsumer::connect(&config.queue, db.clone()).await?;

        let db = Arc::new(db);
        let state = AppState {
            config: config.clone(),
            db,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Traceability service listener bound");

        Ok(Self {
            port,
            listener,
            state,
            queue,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = Router::new()
            .route("/InfoStatus", get(handlers::status::info_status))
            .route("/readstatus", get(handlers::status::read_status))
            .route("/ChangeStatus", post(handlers::gitter::change_status))
            .route("/KovaciLinkaScan", post(handlers::gitter::kovaci_linka_scan))
            .route(
                "/KovaciLinkaCheck",
                post(handlers::gitter::kovaci_linka_check),
            )
            .route(
                "/ProtocolPartInsert",
                post(handlers::protocol::protocol_part_insert),
            )
            .route("/test", get(handlers::app::test_greeting))
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(self.state);

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            queue_enabled = self.queue.is_some(),
            "Service ready to accept connections"
        );

        match self.queue {
            Some(consumer) => {
                tokio::select! {
                    result = axum::serve(self.listener, router) => {
                        if let Err(e) = result {
                            tracing::error!(error = %e, "HTTP server error");
                            return Err(std::io::Error::other(format!("HTTP server error: {}", e)));
                        }
                    }
                    _ = consumer.run() => {
                        tracing::error!("Queue consumer stopped unexpectedly");
                    }
                }
            }
            None => {
                if let Err(e) = axum::serve(self.listener, router).await {
                    tracing::error!(error = %e, "HTTP server error");
                    return Err(std::io::Error::other(format!("HTTP server error: {}", e)));
                }
            }
        }

        Ok(())
    }
}
