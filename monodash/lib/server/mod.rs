//! HTTP interface of the dashboard.
//!
//! A JSON API over [`Monodash`](crate::service::Monodash). Every error is returned as an
//! [`ErrorResponse`]. There is no authentication layer.

mod data;
mod handlers;
mod routes;
mod state;

use std::net::SocketAddr;

use crate::{service::Monodash, MonodashResult};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Serves the API on `addr` until the process receives ctrl-c.
pub async fn serve(service: Monodash, addr: SocketAddr) -> MonodashResult<()> {
    let app = create_router(ServerState::new(service));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use data::*;
pub use handlers::*;
pub use routes::*;
pub use state::*;
