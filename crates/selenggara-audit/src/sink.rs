// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The producer half of the audit queue.

use selenggara_core::types::{ActorContext, AuditAction, AuditEntry};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::AuditCommand;
use crate::clock::AuditClock;

/// Cloneable handle services use to record audit entries.
#[derive(Debug, Clone)]
pub struct AuditSink {
    tx: mpsc::Sender<AuditCommand>,
    clock: AuditClock,
}

impl AuditSink {
    pub(crate) fn new(tx: mpsc::Sender<AuditCommand>, clock: AuditClock) -> Self {
        Self { tx, clock }
    }

    /// Stamp and enqueue an entry. Never blocks and never fails; a full or
    /// closed queue drops the entry with a warning.
    pub fn record(
        &self,
        actor: &ActorContext,
        action: AuditAction,
        module: &str,
        description: impl Into<String>,
    ) {
        let entry = AuditEntry {
            user_id: actor.user_id,
            user_name: actor.user_name.clone(),
            user_no_badan: actor.no_badan.clone(),
            action,
            module: module.to_string(),
            description: description.into(),
            created_at: self.clock.now(),
        };
        match self.tx.try_send(AuditCommand::Record(entry)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(AuditCommand::Record(entry))) => {
                warn!(
                    action = %entry.action,
                    description = %entry.description,
                    "audit queue full, entry dropped"
                );
            }
            Err(mpsc::error::TrySendError::Closed(AuditCommand::Record(entry))) => {
                warn!(
                    action = %entry.action,
                    description = %entry.description,
                    "audit writer stopped, entry dropped"
                );
            }
            Err(_) => {}
        }
    }

    /// Wait until every entry recorded before this call has been handed to storage.
    ///
    /// Returns immediately if the writer has stopped.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(AuditCommand::Flush(done_tx)).await.is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}
