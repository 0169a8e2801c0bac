//! Energy telemetry read handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::{DeviceId, EnergyRollup};
use crate::error::{ErrorResponse, GatewayError};

/// Live energy rollups for every light seen today.
#[derive(Debug, Serialize, ToSchema)]
pub struct EnergyListResponse {
    /// One rollup per light, ordered by device ID.
    pub data: Vec<EnergyRollup>,
}

/// `GET /energy` — Live power and today's energy for all lights.
#[utoipa::path(
    get,
    path = "/api/v1/energy",
    tag = "Energy",
    summary = "List energy rollups",
    description = "Returns the live per-device energy rollups derived from bridge samples. This is a live cache; historical data lives in the persisted event log.",
    responses(
        (status = 200, description = "Current rollups", body = EnergyListResponse),
    )
)]
pub async fn list_energy(State(state): State<AppState>) -> impl IntoResponse {
    Json(EnergyListResponse {
        data: state.energy.rollups(),
    })
}

/// `GET /energy/{id}` — Live rollup for one light.
///
/// # Errors
///
/// Returns [`GatewayError::DeviceNotFound`] if the device has not
/// reported an energy sample today.
#[utoipa::path(
    get,
    path = "/api/v1/energy/{id}",
    tag = "Energy",
    summary = "Get one energy rollup",
    description = "Returns the live rollup for one device.",
    params(
        ("id" = u32, Path, description = "Bridge channel number"),
    ),
    responses(
        (status = 200, description = "Current rollup", body = EnergyRollup),
        (status = 404, description = "No sample for this device today", body = ErrorResponse),
    )
)]
pub async fn get_energy(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<impl IntoResponse, GatewayError> {
    let device_id = DeviceId::new(id);
    let rollup = state
        .energy
        .rollup_for(device_id)
        .ok_or(GatewayError::DeviceNotFound(device_id))?;
    Ok(Json(rollup))
}

/// Energy routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/energy", get(list_energy))
        .route("/energy/{id}", get(get_energy))
}
