// HTTP surface: the form page plus a JSON lookup endpoint.

use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    routing::{get, post},
    BoxError, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod page;
pub mod responses;

use crate::config::ServerSettings;
use crate::core::service::RegoService;
use crate::utils::error::Result;
use page::Pages;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RegoService>,
    pub pages: Arc<Pages>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(service: Arc<RegoService>, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            service,
            pages: Arc::new(Pages::new()?),
            request_timeout,
        })
    }
}

/// Builds the router.
///
/// Layers, outermost first: request tracing, then a request timeout that
/// answers 408 when a lookup runs too long.
pub fn create_router(state: AppState) -> Router {
    let timeout = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|e: BoxError| async move {
            if e.is::<tower::timeout::error::Elapsed>() {
                (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string())
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }))
        .timeout(state.request_timeout);

    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/check", post(handlers::check_form_handler))
        .route("/check-rego", get(handlers::check_rego_handler))
        .route("/health", get(handlers::health_handler))
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and serves until ctrl-c.
pub async fn serve(state: AppState, settings: &ServerSettings) -> Result<()> {
    let address = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Listening on http://{}", address);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
