// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! `/api/equipment` is one endpoint dispatched on the HTTP method and the
//! `action` query parameter. An unrecognised action falls through to the
//! method's default operation.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use selenggara_core::{PluginAdapter, SelenggaraError};
use selenggara_core::types::{ActorContext, HealthStatus, TicketFilter};
use selenggara_ticket::validation::parse_key_part;
use selenggara_ticket::{OptionDraft, StatusChange, TicketDraft, TicketRef};

use crate::auth::actor_from_headers;
use crate::error::{ApiError, ErrorResponse};
use crate::server::GatewayState;

const DEFAULT_LOG_LIMIT: i64 = 10;
const MAX_LOG_LIMIT: i64 = 100;
const MAX_LOG_PAGE: i64 = 1_000_000;

/// Query parameters accepted by `/api/equipment`.
#[derive(Debug, Default, Deserialize)]
pub struct EquipmentQuery {
    pub action: Option<String>,
    pub year: Option<String>,
    pub id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Query parameters accepted by `/api/logs`.
#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub action: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// `/api/equipment`
pub async fn equipment(
    State(state): State<GatewayState>,
    method: Method,
    Query(query): Query<EquipmentQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let actor = actor_from_headers(&headers);
    let action = query.action.as_deref();

    match (method.as_str(), action) {
        ("GET", Some("getNextBil")) => {
            let next = state.tickets.next_bil(query.year.as_deref()).await?;
            Ok(Json(json!({ "nextBil": next })).into_response())
        }
        ("GET", Some("fetch_one")) => {
            let target = TicketRef {
                year: query.year,
                id: query.id,
            };
            Ok(Json(state.tickets.get(&target).await?).into_response())
        }
        ("GET", Some("summary")) => {
            let year = optional_year(query.year.as_deref())?;
            Ok(Json(state.tickets.summary(year).await?).into_response())
        }
        ("GET", Some("fetch_dropdowns")) => Ok(Json(state.dropdowns.fetch().await?).into_response()),
        ("GET", _) => {
            let filter = TicketFilter {
                year: optional_year(query.year.as_deref())?,
                status: query.status.filter(|s| !s.is_empty()),
                search: query.search,
            };
            Ok(Json(state.tickets.list(&filter).await?).into_response())
        }
        ("POST", Some("add_option")) => {
            let draft: OptionDraft = parse_body(&body)?;
            state.dropdowns.add(&actor, &draft).await?;
            Ok(success("Option added successfully"))
        }
        ("POST", Some("delete_option")) => {
            let draft: OptionDraft = parse_body(&body)?;
            state.dropdowns.delete(&actor, &draft).await?;
            Ok(success("Option deleted successfully"))
        }
        ("POST", _) => create(&state, &actor, &body).await,
        ("PUT", Some("update_status")) => {
            let change: StatusChange = parse_body(&body)?;
            state.tickets.update_status(&actor, &change).await?;
            Ok(success("Status updated successfully."))
        }
        ("PUT", _) => {
            let draft: TicketDraft = parse_body(&body)?;
            state.tickets.update(&actor, &draft).await?;
            Ok(success("Equipment updated successfully."))
        }
        ("DELETE", _) => {
            let target: TicketRef = parse_body(&body)?;
            state.tickets.delete(&actor, &target).await?;
            Ok(success("Equipment deleted successfully."))
        }
        _ => Ok(method_not_allowed()),
    }
}

async fn create(state: &GatewayState, actor: &ActorContext, body: &Bytes) -> Result<Response, ApiError> {
    let draft: TicketDraft = parse_body(body)?;
    let ticket = state.tickets.create(actor, &draft).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Equipment added successfully.",
        "id": ticket.id,
        "bil": ticket.bil,
    }))
    .into_response())
}

/// `/api/logs`
pub async fn logs(
    State(state): State<GatewayState>,
    method: Method,
    Query(query): Query<LogsQuery>,
) -> Result<Response, ApiError> {
    if method != Method::GET {
        return Ok(method_not_allowed());
    }
    if query.action.as_deref() != Some("fetch_all") {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid action specified")),
        )
            .into_response());
    }

    let page = parse_number(query.page.as_deref())
        .unwrap_or(1)
        .clamp(1, MAX_LOG_PAGE);
    let limit = parse_number(query.limit.as_deref())
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    let result = state.storage.list_logs(page, limit).await?;
    let total_pages = result.total_pages();
    Ok(Json(json!({
        "success": true,
        "logs": result.logs,
        "total": result.total,
        "page": result.page,
        "limit": result.limit,
        "totalPages": total_pages,
    }))
    .into_response())
}

/// GET /health
///
/// Unauthenticated. Reports 503 when the database is unreachable.
pub async fn health(State(state): State<GatewayState>) -> Response {
    let (code, status, detail) = match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok", None),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, "degraded", Some(reason)),
        Ok(HealthStatus::Unhealthy(reason)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(reason))
        }
        Err(e) => {
            tracing::warn!(error = %e, "health check errored");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "unhealthy",
                Some("health check failed".to_string()),
            )
        }
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        detail,
    };
    (code, Json(body)).into_response()
}

fn success(message: &str) -> Response {
    Json(json!({ "success": true, "message": message })).into_response()
}

fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::new("Method not allowed")),
    )
        .into_response()
}

/// An empty body reads as `{}` so that presence checks report the first
/// missing field.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "rejected request body");
        ApiError(SelenggaraError::invalid("Invalid JSON body"))
    })
}

fn optional_year(value: Option<&str>) -> Result<Option<i64>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(year) => Ok(Some(parse_key_part("year", Some(year))?)),
    }
}

fn parse_number(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_reads_as_default() {
        let draft: TicketRef = parse_body(&Bytes::from_static(b"  \n")).unwrap();
        assert!(draft.year.is_none());
    }

    #[test]
    fn malformed_body_is_a_client_error() {
        let err = parse_body::<TicketRef>(&Bytes::from_static(b"{year:")).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn optional_year_parsing() {
        assert_eq!(optional_year(None).unwrap(), None);
        assert_eq!(optional_year(Some(" ")).unwrap(), None);
        assert_eq!(optional_year(Some("2025")).unwrap(), Some(2025));
        assert!(optional_year(Some("last")).is_err());
    }

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            detail: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
        assert!(!json.contains("detail"));
    }
}
