//! # Foxy-Bot HTTP Service
//!
//! HTTP server relaying GitLab webhooks into Telegram chats.
//!
//! This service provides:
//! - The GitLab webhook endpoint with shared-secret verification
//! - Destination chat selection from the query string or configuration
//! - Delivery through the Telegram Bot API with the upstream response relayed
//! - A liveness endpoint
//!
//! Deciding whether an event is announced, and with which text, is left to
//! [`foxy_bot_core`].

pub mod auth;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod responses;

pub use self::config::{LoggingConfig, ServerConfig, ServiceConfig, TelegramConfig, WebhookConfig};
pub use delivery::{
    ChatDelivery, DeliveryError, DeliveryResponse, SendMessageRequest, TelegramClient,
};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use responses::HealthResponse;

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use foxy_bot_core::{build_notification_with, DefaultFormatter, Notification, NotificationFormatter};
use serde_json::Value;
use std::{collections::HashMap, future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{debug, error, info, instrument, warn};

/// Header used to correlate log lines of one request.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Outbound chat delivery
    pub delivery: Arc<dyn ChatDelivery>,

    /// Formatter set used to render events
    pub formatter: Arc<dyn NotificationFormatter>,
}

impl AppState {
    /// Create new application state with the default formatters
    pub fn new(config: ServiceConfig, delivery: Arc<dyn ChatDelivery>) -> Self {
        Self::with_formatter(config, delivery, Arc::new(DefaultFormatter))
    }

    /// Create new application state with a specific formatter set
    pub fn with_formatter(
        config: ServiceConfig,
        delivery: Arc<dyn ChatDelivery>,
        formatter: Arc<dyn NotificationFormatter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            delivery,
            formatter,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;

    let mut router = Router::new()
        .route(&state.config.webhook.endpoint_path, post(handle_webhook))
        .route(crate::config::HEALTH_PATH, get(handle_health_check));

    if server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(TimeoutLayer::new(Duration::from_secs(server.timeout_seconds)))
                .map_response(IntoResponse::into_response)
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(server.max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Builds the Telegram client from `config`, binds the listener and serves
/// until SIGINT or SIGTERM. In-flight requests get
/// `server.shutdown_timeout_seconds` to finish.
pub async fn start_server(config: ServiceConfig) -> Result<(), ServiceError> {
    let delivery = Arc::new(TelegramClient::new(&config.telegram)?);
    let state = AppState::new(config.clone(), delivery);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            ServiceError::Configuration(ConfigError::Invalid {
                message: format!(
                    "server address '{}:{}' is invalid: {}",
                    config.server.host, config.server.port, e
                ),
            })
        })?;

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!(
        address = %addr,
        endpoint = %config.webhook.endpoint_path,
        "Starting HTTP server"
    );

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Initiating graceful shutdown"
            );
            let _ = shutdown_tx.send(true);
        })
        .into_future();

    let drain_deadline = async move {
        let _ = shutdown_rx.wait_for(|requested| *requested).await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = drain_deadline => {
            warn!("Graceful shutdown timed out; abandoning in-flight requests");
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolve on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Handle GitLab webhook requests
///
/// 1. Verify `X-Gitlab-Token` when a secret is configured
/// 2. Resolve the destination chat (query parameter, then configured default)
/// 3. Render the event; nothing to send answers `200 OK` with an empty body
/// 4. Send the message and relay Telegram's status and JSON body
///
/// GitLab retries webhooks that are not answered within 10 seconds, so no
/// step retries on its own.
#[instrument(skip(state, params, headers, body), fields(event_type, chat_id))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookHandlerError> {
    auth::verify_gitlab_token(state.config.webhook.secret_token.as_deref(), &headers)?;

    let query_param = &state.config.webhook.chat_id_query_param;
    let chat_id = params
        .get(query_param)
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .or(state.config.telegram.default_chat_id.as_deref())
        .ok_or_else(|| WebhookHandlerError::MissingChatId {
            query_param: query_param.clone(),
        })?
        .to_string();

    let event_type = auth::gitlab_event_label(&headers);
    let span = tracing::Span::current();
    span.record("event_type", event_type);
    span.record("chat_id", chat_id.as_str());

    let payload: Value = serde_json::from_slice(&body).unwrap_or_else(|e| {
        debug!(error = %e, "Webhook body is not JSON");
        Value::Null
    });

    let text = match build_notification_with(state.formatter.as_ref(), event_type, &payload) {
        Notification::Empty => {
            info!("Event is not announced; acknowledging without delivery");
            return Ok(StatusCode::OK.into_response());
        }
        Notification::Text(text) => text,
    };

    let request = SendMessageRequest::markdown(chat_id, text);
    let response = state.delivery.send_message(&request).await?;

    if response.is_success() {
        info!(status = response.status, "Notification delivered");
    } else {
        warn!(
            status = response.status,
            body = %response.body,
            "Telegram rejected the notification"
        );
    }

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(response.body)).into_response())
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Basic health check endpoint
#[instrument]
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

// ============================================================================
// Middleware
// ============================================================================

/// Tag each request with a correlation id and log its outcome.
///
/// The id is taken from `x-correlation-id` when the caller sends one and is
/// echoed back on the response. Only the path is logged because the query
/// string may carry the destination chat id.
#[instrument(
    name = "request",
    skip_all,
    fields(method = %request.method(), path = %request.uri().path(), correlation_id)
)]
async fn request_logging_middleware(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let start = std::time::Instant::now();
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    let mut response = next.run(request).await;
    if let Ok(value) = correlation_id.parse() {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;
    match response.status() {
        s if s.is_server_error() => error!(status, duration_ms, "Request failed"),
        s if s.is_client_error() => warn!(status, duration_ms, "Request rejected"),
        _ => debug!(status, duration_ms, "Request completed"),
    }

    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
