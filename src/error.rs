//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Nothing in this crate terminates the process over an error: transport
//! failures degrade to fallback handling, decode failures are logged and
//! dropped, and command timeouts surface as failed outcomes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::DeviceId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "device not found: 7",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | State/Not Found | 404 Not Found              |
/// | 3000–3999 | Server          | 500 Internal Server Error  |
/// | 4000–4999 | Bridge-Specific | 502 / 503 / 504            |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Device with the given ID has never reported and is unknown.
    #[error("device not found: {0}")]
    DeviceNotFound(DeviceId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unsupported or invalid command verb.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// An inbound bridge frame could not be decoded. Logged and dropped
    /// at the transport; never fatal.
    #[error("frame decode error: {0}")]
    DecodeError(String),

    /// A send was attempted while the bridge transport is disconnected.
    /// Recovered locally via the fallback path, not surfaced to clients
    /// as a hard failure.
    #[error("bridge transport unavailable")]
    TransportUnavailable,

    /// No response arrived for a dispatched command within the bound.
    #[error("command timed out: {0}")]
    CommandTimeout(crate::domain::CorrelationId),

    /// The fallback request path itself failed.
    #[error("fallback request failed: {0}")]
    FallbackError(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidCommand(_) => 1002,
            Self::DecodeError(_) => 1003,
            Self::DeviceNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::TransportUnavailable => 4001,
            Self::CommandTimeout(_) => 4002,
            Self::FallbackError(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidCommand(_) | Self::DecodeError(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::DeviceNotFound(_) => StatusCode::NOT_FOUND,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TransportUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::CommandTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::FallbackError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn device_not_found_maps_to_404() {
        let err = GatewayError::DeviceNotFound(DeviceId::new(7));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
    }

    #[test]
    fn transport_unavailable_maps_to_503() {
        let err = GatewayError::TransportUnavailable;
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn messages_name_the_subject() {
        let err = GatewayError::DeviceNotFound(DeviceId::new(7));
        assert_eq!(err.to_string(), "device not found: 7");
    }
}
