//! HTTP surface: one route, `/api/v0/prices`, with GET (export) and POST
//! (ingest). Every other method answers 405.

pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use crate::config::PRICES_ROUTE;

pub use error::AppError;
pub use state::AppState;

/// Build the application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route(
            PRICES_ROUTE,
            get(routes::prices::export_prices)
                .post(routes::prices::ingest_prices)
                .fallback(routes::prices::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serve the router on an already-bound listener until the server stops.
///
/// Peer addresses are made available to handlers for request logging.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    let app = router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
