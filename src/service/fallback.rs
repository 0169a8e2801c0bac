//! Secondary request path used when the bridge transport is down.
//!
//! The controller firmware exposes a slow out-of-band HTTP endpoint
//! alongside its streaming interface. [`FallbackPath`] abstracts that
//! call so the dispatcher can be tested without a live bridge;
//! [`HttpFallback`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{DeviceId, LightCommand};
use crate::error::GatewayError;

/// Synchronous result of a fallback control request.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackResult {
    /// Whether the bridge applied the command.
    pub success: bool,
    /// Failure detail when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

/// Out-of-band request/response call to the bridge, independent of the
/// transport channel.
#[async_trait]
pub trait FallbackPath: Send + Sync {
    /// Executes one control request and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::FallbackError`] when the fallback endpoint
    /// itself is unreachable or answers malformed data. The dispatcher
    /// folds this into a failed [`crate::service::ControlOutcome`] rather
    /// than surfacing a hard error.
    async fn request(
        &self,
        device_id: DeviceId,
        command: LightCommand,
        params: Option<&Value>,
    ) -> Result<FallbackResult, GatewayError>;
}

/// HTTP implementation of the fallback path.
#[derive(Debug, Clone)]
pub struct HttpFallback {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFallback {
    /// Creates a fallback client for the bridge's HTTP endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the underlying HTTP client
    /// cannot be constructed (TLS backend initialization).
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl FallbackPath for HttpFallback {
    async fn request(
        &self,
        device_id: DeviceId,
        command: LightCommand,
        params: Option<&Value>,
    ) -> Result<FallbackResult, GatewayError> {
        let url = format!("{}/control", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "deviceId": device_id,
            "command": command,
            "params": params,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::FallbackError(e.to_string()))?
            .error_for_status()
            .map_err(|e| GatewayError::FallbackError(e.to_string()))?;

        response
            .json::<FallbackResult>()
            .await
            .map_err(|e| GatewayError::FallbackError(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn result_deserializes_with_and_without_error() {
        let ok: FallbackResult = serde_json::from_str(r#"{"success":true}"#)
            .ok()
            .unwrap_or_else(|| panic!("deserialization failed"));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed: FallbackResult =
            serde_json::from_str(r#"{"success":false,"error":"device busy"}"#)
                .ok()
                .unwrap_or_else(|| panic!("deserialization failed"));
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("device busy"));
    }
}
