// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the complete service stack the way `serve` does:
//! a temp-dir SQLite database in WAL mode, the audit writer task, the ticket
//! and dropdown services and the axum router. Requests are driven through
//! the router without binding a socket.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use selenggara_audit::{AuditSink, audit_channel};
use selenggara_config::model::StorageConfig;
use selenggara_core::types::ActorContext;
use selenggara_core::{PluginAdapter, SelenggaraError, StorageAdapter};
use selenggara_gateway::{GatewayState, HealthState, ServerConfig, build_router};
use selenggara_storage::SqliteStorage;
use selenggara_ticket::{DropdownService, TicketService};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    bearer_token: Option<String>,
    lenient_required_dates: bool,
    audit_capacity: usize,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            bearer_token: None,
            lenient_required_dates: false,
            audit_capacity: 256,
        }
    }

    /// Require this bearer token on `/api/*`.
    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.bearer_token = Some(token.to_string());
        self
    }

    /// Store malformed `tarikhDiresit` values as null instead of rejecting them.
    pub fn with_lenient_required_dates(mut self) -> Self {
        self.lenient_required_dates = true;
        self
    }

    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, SelenggaraError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| SelenggaraError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let (audit, writer) = audit_channel(self.audit_capacity, 480);
        let audit_task = writer.spawn(Arc::clone(&storage));

        let tickets = TicketService::new(
            Arc::clone(&storage),
            audit.clone(),
            self.lenient_required_dates,
        );
        let dropdowns = DropdownService::new(Arc::clone(&storage), audit.clone());

        let state = GatewayState {
            tickets: tickets.clone(),
            dropdowns: dropdowns.clone(),
            storage: Arc::clone(&storage),
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
        };
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            bearer_token: self.bearer_token,
            cors_origins: Vec::new(),
        };
        let router = build_router(&config, state);

        Ok(TestHarness {
            storage,
            tickets,
            dropdowns,
            audit,
            router,
            audit_task,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete service stack over a throwaway database.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    pub tickets: TicketService,
    pub dropdowns: DropdownService,
    pub audit: AuditSink,
    /// Router with the same layers `serve` installs.
    pub router: Router,
    audit_task: JoinHandle<()>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Send a request as the anonymous actor. Returns the status and the
    /// decoded JSON body (`Null` when empty).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), SelenggaraError> {
        self.request_as(&ActorContext::anonymous(), method, uri, body)
            .await
    }

    /// Send a request carrying `actor` in the `X-User-*` headers.
    pub async fn request_as(
        &self,
        actor: &ActorContext,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), SelenggaraError> {
        let mut builder = Request::builder().method(method).uri(uri);
        if !actor.is_anonymous() {
            builder = builder
                .header("x-user-id", actor.user_id.to_string())
                .header("x-user-name", actor.user_name.as_str())
                .header("x-user-nobadan", actor.no_badan.as_str());
            if let Some(role) = &actor.user_role {
                builder = builder.header("x-user-role", role.as_str());
            }
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder
            .body(body)
            .map_err(|e| SelenggaraError::Internal(format!("invalid test request: {e}")))?;
        self.send(request).await
    }

    /// Send a prebuilt request.
    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value), SelenggaraError> {
        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| SelenggaraError::Internal(format!("unreadable response body: {e}")))?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| SelenggaraError::Internal(format!("response body is not JSON: {e}")))?
        };
        Ok((status, value))
    }

    /// Wait until every audit entry recorded so far is in storage.
    pub async fn flush_audit(&self) {
        self.audit.flush().await;
    }

    /// Flush the audit trail, stop the writer and checkpoint the database.
    pub async fn shutdown(self) -> Result<(), SelenggaraError> {
        let TestHarness {
            storage,
            tickets,
            dropdowns,
            audit,
            router,
            audit_task,
            _temp_dir,
        } = self;
        audit.flush().await;
        drop((tickets, dropdowns, router, audit));
        audit_task
            .await
            .map_err(|e| SelenggaraError::Internal(format!("audit writer panicked: {e}")))?;
        storage.shutdown().await
    }
}
