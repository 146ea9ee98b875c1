//! Audex API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod dto;
mod error;
mod handlers;
mod state;

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use audex_application::AuditQueryService;
use audex_core::AppError;
use audex_infrastructure::PostgresAuditEventStore;

use crate::api_config::ApiConfig;
use crate::state::AppState;

static MIGRATOR: Migrator = sqlx::migrate!("../../crates/infrastructure/migrations");

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("migrations applied; exiting");
        return Ok(());
    }

    let store = Arc::new(PostgresAuditEventStore::new(pool));
    let state = AppState {
        audit_query_service: AuditQueryService::new(store),
    };

    let router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/audit_events", get(handlers::list_audit_events_handler))
        .route("/audit_events/{id}", get(handlers::get_audit_event_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let host = IpAddr::from_str(config.api_host.as_str())
        .map_err(|error| AppError::Validation(format!("invalid API_HOST: {error}")))?;
    let address = SocketAddr::new(host, config.api_port);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;
    info!(%address, "audex api listening");

    axum::serve(listener, router)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
