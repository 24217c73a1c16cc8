//! Talentdesk API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod client_session;
mod dto;
mod error;
mod handlers;
mod middleware;
mod session_layer;
mod session_registry;
mod state;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use talentdesk_application::{JobCatalogService, SessionService};
use talentdesk_core::AppError;
use talentdesk_infrastructure::{
    MIGRATOR, PostgresJobStore, PostgresProfileStore, PostgresRoleStore, SupabaseAuthProvider,
};
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::session_layer::{SESSION_IDLE_MINUTES, build_session_layer};
use crate::session_registry::{SessionFactory, SessionRegistry};
use crate::state::AppState;

const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    if config.admin_allowlist.is_empty() {
        warn!("ADMIN_EMAILS is empty; administrators come from stored role records only");
    }

    let session_layer = build_session_layer(pool.clone(), config.cookie_secure).await?;

    let http_client = reqwest::Client::new();
    let role_store = Arc::new(PostgresRoleStore::new(pool.clone()));
    let profile_store = Arc::new(PostgresProfileStore::new(pool.clone()));
    let factory: SessionFactory = {
        let config = config.clone();
        Arc::new(move || {
            SessionService::new(
                Arc::new(SupabaseAuthProvider::new(
                    http_client.clone(),
                    config.supabase_url.clone(),
                    config.supabase_anon_key.clone(),
                )),
                role_store.clone(),
                profile_store.clone(),
                config.admin_allowlist.clone(),
                config.registration_retry,
            )
        })
    };
    let sessions = SessionRegistry::new(
        factory,
        Duration::from_secs(SESSION_IDLE_MINUTES.unsigned_abs() * 60),
    );

    let pruning = {
        let sessions = sessions.clone();
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(SESSION_PRUNE_INTERVAL);
            loop {
                ticks.tick().await;
                sessions.prune_idle().await;
            }
        })
    };

    let app_state = AppState {
        sessions: sessions.clone(),
        job_catalog_service: JobCatalogService::new(Arc::new(PostgresJobStore::new(pool))),
        frontend_url: config.frontend_url.clone(),
    };
    let app = api_router::build_router(app_state, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "talentdesk-api listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")));

    pruning.abort();
    sessions.dispose_all().await;
    served
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
