// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Selenggara maintenance tracker.
//!
//! Exposes the ticket and dropdown services and the audit log over the JSON
//! contract the existing frontend speaks: one endpoint per resource,
//! dispatched on method and `action`, with `{success, message}` and
//! `{success: false, error, field}` bodies.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::{AuthConfig, actor_from_headers};
pub use error::{ApiError, ErrorResponse};
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
