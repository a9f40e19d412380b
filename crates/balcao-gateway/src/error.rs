// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Central mapping from adapter errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use balcao_core::BalcaoError;

/// Wrapper that turns a [`BalcaoError`] into the dashboard's error
/// envelope: `{"success": false, "error": "..."}` with a status derived
/// from the variant.
#[derive(Debug)]
pub struct ApiError(pub BalcaoError);

impl From<BalcaoError> for ApiError {
    fn from(err: BalcaoError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BalcaoError::Validation(_) => StatusCode::BAD_REQUEST,
            BalcaoError::NotFound(_) => StatusCode::NOT_FOUND,
            BalcaoError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            BalcaoError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            BalcaoError::UpstreamAuth { .. }
            | BalcaoError::Upstream { .. }
            | BalcaoError::Channel { .. }
            | BalcaoError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = Json(json!({
            "success": false,
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Shorthand for a 400 validation failure with a literal message.
pub fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError(BalcaoError::Validation(message.into()))
}
