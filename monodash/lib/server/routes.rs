//! Route definitions for the HTTP server.

use axum::{
    routing::{get, post},
    Router,
};

use super::{handlers, state::ServerState};

//-------------------------------------------------------------------------------------------------
// Functions
//-------------------------------------------------------------------------------------------------

/// Creates a new router with all API endpoints configured
///
/// ## Arguments
/// * `state` - The shared server state
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/dashboard", get(handlers::dashboard_handler))
        .route("/host", get(handlers::host_handler))
        .route("/host/refresh", post(handlers::refresh_host_handler))
        .route(
            "/instances",
            get(handlers::list_instances_handler).post(handlers::create_instance_handler),
        )
        .route("/instances/update", post(handlers::update_instance_handler))
        .route("/instances/{handle}", get(handlers::get_instance_handler))
        .route(
            "/instances/{handle}/metrics",
            get(handlers::query_metrics_handler).post(handlers::record_metrics_handler),
        )
        .route("/actions", post(handlers::action_handler))
        .with_state(state)
}
