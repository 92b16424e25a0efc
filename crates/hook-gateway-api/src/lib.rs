//! # Hook Gateway HTTP Service
//!
//! HTTP front end for the webhook gateway.
//!
//! Every path is served by a single handler:
//! - `POST` requests are buffered and handed to the [`WebhookGateway`]
//! - any other method returns a plain-text index banner
//!
//! Responses are plain text with status 200 or 500 only.

pub mod config;
pub mod errors;

pub use config::{
    LoggingConfig, RetryConfig, ServerConfig, ServiceConfig, TenantConfig, WebhookConfig,
};
pub use errors::{ConfigError, ServiceError};

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use chrono::{DateTime, Utc};
use hook_gateway_core::{
    GatewayError, ShutdownSignal, ShutdownTrigger, WebhookGateway, WebhookRequest,
    WebhookResponse,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Webhook pipeline shared by all requests
    pub gateway: Arc<WebhookGateway>,

    /// Cloned into every request so pending retries stop on shutdown
    pub shutdown: ShutdownSignal,

    /// Reported by the index page
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig, gateway: WebhookGateway, shutdown: ShutdownSignal) -> Self {
        Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
            shutdown,
            started_at: Utc::now(),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the HTTP router. All paths and methods reach [`handle_request`].
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(handle_request)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM. On shutdown the gateway's pending retries
/// are cancelled and in-flight requests are allowed to complete.
pub async fn start_server(config: ServiceConfig, gateway: WebhookGateway) -> Result<(), ServiceError> {
    let (trigger, shutdown) = ShutdownSignal::channel();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let addr: SocketAddr = addr.parse().map_err(|e| ServiceError::BindFailed {
        address: addr.clone(),
        message: format!("invalid address: {}", e),
    })?;

    let app = create_router(AppState::new(config, gateway, shutdown));

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on_signal(trigger))
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Wait for SIGINT/SIGTERM, then flip the shutdown trigger.
async fn shutdown_on_signal(trigger: ShutdownTrigger) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }

    trigger.trigger();
}

// ============================================================================
// Handlers
// ============================================================================

/// Entry point for every request.
#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn handle_request(State(state): State<AppState>, request: Request) -> Response {
    if request.method() != Method::POST {
        return handle_index(&state);
    }

    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.config.server.max_body_size).await {
        Ok(body) => body,
        Err(e) => {
            let error = GatewayError::ReadBody(e.to_string());
            error!(error = %error, "Failed to read request body");
            return into_http_response(error.into());
        }
    };

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string())));
    let webhook_request = WebhookRequest::from_parts(headers, body);

    let response = state
        .gateway
        .handle(&webhook_request, state.shutdown.clone())
        .await;

    into_http_response(response)
}

/// Plain-text liveness banner.
fn handle_index(state: &AppState) -> Response {
    let banner = format!(
        "Hook Gateway {}\nstarted at {}\n",
        env!("CARGO_PKG_VERSION"),
        state.started_at.to_rfc3339()
    );
    (StatusCode::OK, banner).into_response()
}

/// Map a gateway outcome onto an HTTP response.
pub fn into_http_response(response: WebhookResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, response.body()).into_response()
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
