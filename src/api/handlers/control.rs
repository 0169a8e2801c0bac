//! Device control handler.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::ControlRequest;
use crate::app_state::AppState;
use crate::domain::DeviceId;
use crate::error::ErrorResponse;
use crate::service::ControlOutcome;

/// `POST /devices/{id}/control` — Issue a control command.
///
/// Responds `202 Accepted` with a correlation ID while the bridge
/// transport is up; the final resolution arrives on the
/// `controlResponse` topic. When the transport is down the fallback path
/// serves the command synchronously and the response is `200 OK` with
/// its final result. Commands are accepted for unknown devices too:
/// discovery is dynamic, and the bridge is the authority on which
/// channels exist.
#[utoipa::path(
    post,
    path = "/api/v1/devices/{id}/control",
    tag = "Control",
    summary = "Control a device",
    description = "Sends a command to the bridge for one device. Accepted optimistically over the transport, or completed synchronously via the fallback path when the bridge connection is down.",
    params(
        ("id" = u32, Path, description = "Bridge channel number"),
    ),
    request_body = ControlRequest,
    responses(
        (status = 202, description = "Command accepted; resolution follows on controlResponse", body = ControlOutcome),
        (status = 200, description = "Command completed via the fallback path", body = ControlOutcome),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn control_device(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(req): Json<ControlRequest>,
) -> impl IntoResponse {
    let outcome = state
        .control
        .send_control(DeviceId::new(id), req.command, req.params)
        .await;

    let status = match &outcome {
        ControlOutcome::Accepted { .. } => StatusCode::ACCEPTED,
        ControlOutcome::Completed { .. } => StatusCode::OK,
    };
    (status, Json(outcome))
}

/// Control routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/devices/{id}/control", post(control_device))
}
