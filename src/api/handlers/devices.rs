//! Device read handlers: list, get, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::{PaginationMeta, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{DeviceId, DeviceStatus};
use crate::error::{ErrorResponse, GatewayError};

/// Paginated device list response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceListResponse {
    /// Devices on the current page.
    pub data: Vec<DeviceStatus>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// `GET /devices` — List all known devices with pagination.
#[utoipa::path(
    get,
    path = "/api/v1/devices",
    tag = "Devices",
    summary = "List devices",
    description = "Returns a paginated snapshot of every device the bridge has reported, ordered by device ID.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated device list", body = DeviceListResponse),
    )
)]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let params = params.clamped();
    let snapshot = state.store.snapshot();

    let total = snapshot.len() as u32;
    let start = ((params.page - 1) * params.per_page) as usize;
    let data: Vec<DeviceStatus> = snapshot
        .into_iter()
        .skip(start)
        .take(params.per_page as usize)
        .collect();

    Json(DeviceListResponse {
        data,
        pagination: PaginationMeta::for_total(&params, total),
    })
}

/// `GET /devices/{id}` — Get the projected status of one device.
///
/// # Errors
///
/// Returns [`GatewayError::DeviceNotFound`] if the device never reported.
#[utoipa::path(
    get,
    path = "/api/v1/devices/{id}",
    tag = "Devices",
    summary = "Get device status",
    description = "Returns the last status the bridge reported for one device.",
    params(
        ("id" = u32, Path, description = "Bridge channel number"),
    ),
    responses(
        (status = 200, description = "Device status", body = DeviceStatus),
        (status = 404, description = "Device not found", body = ErrorResponse),
    )
)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<impl IntoResponse, GatewayError> {
    let device_id = DeviceId::new(id);
    let status = state
        .store
        .current_status(device_id)
        .ok_or(GatewayError::DeviceNotFound(device_id))?;
    Ok(Json(status))
}

/// `DELETE /devices/{id}` — Remove a device from the snapshot.
///
/// This is the explicit removal path: the projector itself never drops
/// entries, so deleting a decommissioned light goes through here. The
/// device reappears if the bridge reports it again.
///
/// # Errors
///
/// Returns [`GatewayError::DeviceNotFound`] if the device is unknown.
#[utoipa::path(
    delete,
    path = "/api/v1/devices/{id}",
    tag = "Devices",
    summary = "Remove a device",
    description = "Explicitly removes a device entry from the in-memory snapshot.",
    params(
        ("id" = u32, Path, description = "Bridge channel number"),
    ),
    responses(
        (status = 204, description = "Device removed"),
        (status = 404, description = "Device not found", body = ErrorResponse),
    )
)]
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<impl IntoResponse, GatewayError> {
    let device_id = DeviceId::new(id);
    state
        .store
        .remove(device_id)
        .ok_or(GatewayError::DeviceNotFound(device_id))?;
    tracing::info!(device = %device_id, "device removed from snapshot");
    Ok(StatusCode::NO_CONTENT)
}

/// Device routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/devices", get(list_devices))
        .route("/devices/{id}", get(get_device).delete(delete_device))
}
