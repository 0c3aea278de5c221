//! HTTP server setup: router, CORS and graceful shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use super::routes::{api_router, health};
use super::ApiState;

pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .nest("/api", api_router())
        .layer(cors)
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<ApiState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// Bind `bind` and serve until Ctrl-C.
pub async fn run(bind: SocketAddr, state: Arc<ApiState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!(%bind, "HTTP server listening");

    serve(listener, state, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down");
    })
    .await
}
