// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request identity for the gateway.
//!
//! Two separate concerns live here:
//! 1. Optional bearer token on `/api/*` (`Authorization: Bearer <token>`).
//! 2. The actor taken from the `X-User-*` headers set by the session layer
//!    in front of this service. Login itself is not enforced here.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use selenggara_core::types::ActorContext;

use crate::error::ErrorResponse;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_NO_BADAN_HEADER: &str = "x-user-nobadan";

/// Authentication configuration for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` leaves the API open.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware that rejects requests without the configured bearer token.
///
/// Only installed when a token is configured.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(ref expected_token) = auth.bearer_token {
        let presented = request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if presented != Some(expected_token.as_str()) {
            tracing::debug!(path = %request.uri().path(), "bearer token rejected");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Unauthorized")),
            )
                .into_response();
        }
    }
    next.run(request).await
}

/// Build the actor for a request. A missing or non-numeric user id yields
/// the anonymous `System` actor.
pub fn actor_from_headers(headers: &HeaderMap) -> ActorContext {
    let text = |name: &str| {
        headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let Some(user_id) = text(USER_ID_HEADER).and_then(|id| id.parse::<i64>().ok()) else {
        return ActorContext::anonymous();
    };
    let anonymous = ActorContext::anonymous();
    ActorContext {
        user_id,
        user_name: text(USER_NAME_HEADER).unwrap_or(anonymous.user_name),
        user_role: text(USER_ROLE_HEADER),
        no_badan: text(USER_NO_BADAN_HEADER).unwrap_or(anonymous.no_badan),
    }
}
