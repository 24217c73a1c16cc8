use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use talentdesk_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(
    app_state: AppState,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let cors_layer = cors::build_cors_layer(&app_state.frontend_url)?;

    let session_routes = Router::new()
        .route("/api/session", get(handlers::session::session_handler))
        .route(
            "/api/session/sign-in",
            post(handlers::session::sign_in_handler),
        )
        .route(
            "/api/session/sign-out",
            post(handlers::session::sign_out_handler),
        )
        .route(
            "/api/session/register",
            post(handlers::session::register_handler),
        )
        .route(
            "/api/session/register/complete",
            post(handlers::session::complete_registration_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ));

    let job_routes = Router::new()
        .route("/api/jobs", get(handlers::jobs::list_published_jobs_handler))
        .route("/api/jobs/facets", get(handlers::jobs::job_facets_handler))
        .route("/api/admin/jobs", get(handlers::jobs::list_all_jobs_handler));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(session_routes)
        .merge(job_routes)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
