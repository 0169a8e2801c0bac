//! System endpoints: health check and command catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::transport::ConnectionState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    bridge: ConnectionState,
    bridge_failures: u32,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
///
/// The service itself is healthy even while the bridge is unreachable;
/// the bridge state is reported alongside so dashboards can distinguish
/// the two.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, bridge connectivity, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            bridge: state.transport.state(),
            bridge_failures: state.transport.failure_count(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Supported command verb info.
#[derive(Debug, Serialize, ToSchema)]
struct CommandInfo {
    command: &'static str,
    description: &'static str,
    params: Option<&'static str>,
}

/// `GET /config/commands` — List supported control commands.
#[utoipa::path(
    get,
    path = "/config/commands",
    tag = "System",
    summary = "List supported commands",
    description = "Returns metadata for every control command the bridge understands.",
    responses(
        (status = 200, description = "Command catalog", body = Vec<CommandInfo>),
    )
)]
pub async fn commands_handler() -> impl IntoResponse {
    let commands = vec![
        CommandInfo {
            command: "on",
            description: "Switch the light on at full output",
            params: None,
        },
        CommandInfo {
            command: "off",
            description: "Switch the light off",
            params: None,
        },
        CommandInfo {
            command: "dim",
            description: "Dim the light to a target level",
            params: Some("{\"level\": 0..=255}"),
        },
    ];
    (StatusCode::OK, Json(commands))
}

/// `GET /config/topics` — List subscribable event topics.
#[utoipa::path(
    get,
    path = "/config/topics",
    tag = "System",
    summary = "List event topics",
    description = "Returns the wire names of every topic a WebSocket client can subscribe to.",
    responses(
        (status = 200, description = "Topic catalog", body = Vec<String>),
    )
)]
pub async fn topics_handler() -> impl IntoResponse {
    let topics: Vec<&'static str> = crate::domain::Topic::ALL
        .iter()
        .map(crate::domain::Topic::as_str)
        .collect();
    (StatusCode::OK, Json(topics))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/commands", get(commands_handler))
        .route("/config/topics", get(topics_handler))
}
