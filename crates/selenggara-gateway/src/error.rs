// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of [`SelenggaraError`] onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use selenggara_core::SelenggaraError;

/// Failure body: `{"success": false, "error": "...", "field": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            field: None,
        }
    }
}

/// A handler error. Server-side failures are logged here and never leak
/// their details to the client.
#[derive(Debug)]
pub struct ApiError(pub SelenggaraError);

impl From<SelenggaraError> for ApiError {
    fn from(err: SelenggaraError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SelenggaraError::Validation { .. } => StatusCode::BAD_REQUEST,
            SelenggaraError::Conflict { .. } => StatusCode::CONFLICT,
            SelenggaraError::NotFound(_) => StatusCode::NOT_FOUND,
            SelenggaraError::Storage { .. }
            | SelenggaraError::Config(_)
            | SelenggaraError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if self.0.is_client_error() {
            ErrorResponse {
                success: false,
                error: self.0.to_string(),
                field: self.0.field(),
            }
        } else {
            tracing::error!(error = %self.0, "request failed");
            ErrorResponse::new("Internal server error")
        };
        (status, Json(body)).into_response()
    }
}
