// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `selenggara serve` command implementation.
//!
//! Opens storage, starts the audit writer, wires the ticket and dropdown
//! services into the gateway and serves HTTP until SIGINT/SIGTERM. On the
//! way out the audit queue is drained and the WAL checkpointed.

use std::sync::Arc;

use selenggara_audit::audit_channel;
use selenggara_config::SelenggaraConfig;
use selenggara_core::{PluginAdapter, SelenggaraError, StorageAdapter};
use selenggara_gateway::{GatewayState, HealthState, ServerConfig, start_server};
use selenggara_storage::SqliteStorage;
use selenggara_ticket::{DropdownService, TicketService};
use tracing::{info, warn};

use crate::shutdown;

pub async fn run_serve(config: SelenggaraConfig) -> Result<(), SelenggaraError> {
    init_tracing(&config.server.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting selenggara serve");

    // Initialize storage.
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

    warn_on_sparse_years(storage.as_ref()).await;

    let (audit, writer) =
        audit_channel(config.audit.channel_capacity, config.audit.utc_offset_minutes);
    let audit_task = writer.spawn(Arc::clone(&storage));

    if config.tickets.lenient_required_dates {
        warn!("tickets.lenient_required_dates is on, malformed tarikhDiresit values are stored as null");
    }

    let state = GatewayState {
        tickets: TicketService::new(
            Arc::clone(&storage),
            audit.clone(),
            config.tickets.lenient_required_dates,
        ),
        dropdowns: DropdownService::new(Arc::clone(&storage), audit.clone()),
        storage: Arc::clone(&storage),
        health: HealthState {
            start_time: std::time::Instant::now(),
        },
    };

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&gateway_config(&config), state, cancel.clone()).await;
    cancel.cancel();

    // The server has dropped its services; this sink is the last sender.
    audit.flush().await;
    drop(audit);
    if let Err(e) = audit_task.await {
        warn!(error = %e, "audit writer task ended abnormally");
    }
    storage.shutdown().await?;

    served?;
    info!("selenggara serve shutdown complete");
    Ok(())
}

fn gateway_config(config: &SelenggaraConfig) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        bearer_token: config.gateway.bearer_token.clone(),
        cors_origins: config.server.cors_origins.clone(),
    }
}

/// Log years whose BIL sequence is no longer 1..N.
async fn warn_on_sparse_years(storage: &dyn StorageAdapter) {
    match storage.year_density().await {
        Ok(years) => {
            for year in years.iter().filter(|y| !y.is_dense()) {
                warn!(
                    year = year.year,
                    count = year.count,
                    max_bil = year.max_bil,
                    "BIL sequence has gaps or duplicates, run `selenggara repair --year {}`",
                    year.year
                );
            }
        }
        Err(e) => warn!(error = %e, "could not check BIL sequences"),
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "selenggara={log_level},selenggara_gateway={log_level},selenggara_ticket={log_level},\
             selenggara_storage={log_level},selenggara_audit={log_level},tower_http={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_config_copies_server_and_gateway_sections() {
        let mut config = SelenggaraConfig::default();
        config.server.port = 9090;
        config.server.cors_origins = vec!["https://ict.example".into()];
        config.gateway.bearer_token = Some("t".into());

        let gw = gateway_config(&config);
        assert_eq!(gw.port, 9090);
        assert_eq!(gw.host, config.server.host);
        assert_eq!(gw.bearer_token.as_deref(), Some("t"));
        assert_eq!(gw.cors_origins.len(), 1);
    }
}
