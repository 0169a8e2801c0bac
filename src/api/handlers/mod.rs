//! REST endpoint handlers organized by resource.

pub mod control;
pub mod devices;
pub mod energy;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(devices::routes())
        .merge(control::routes())
        .merge(energy::routes())
}
