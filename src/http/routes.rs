use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Frames and note uploads exceed axum's 2 MB default
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let reports = ServeDir::new(&state.report_dir);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/ice-config", get(handlers::get_ice_config))
        // Video sessions
        .route("/sessions", post(handlers::start_session))
        .route("/sessions/:session_id/frames", post(handlers::submit_frame))
        .route(
            "/sessions/:session_id/reconnect",
            post(handlers::reconnect_session),
        )
        .route("/sessions/:session_id/end", post(handlers::end_session))
        .route("/sessions/:session_id", delete(handlers::delete_session))
        // Session queries
        .route(
            "/sessions/:session_id/status",
            get(handlers::get_session_status),
        )
        .route(
            "/sessions/:session_id/summary",
            get(handlers::get_session_summary),
        )
        // Notes and reports
        .route("/notes", post(handlers::upload_note))
        .route("/reports", post(handlers::generate_report))
        .route("/reports/send", post(handlers::send_report))
        .nest_service("/static", reports)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
